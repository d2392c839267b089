//! API error types.

use crate::transfer::TransferError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("metadata error: {0}")]
    Metadata(#[from] handoff_metadata::MetadataError),

    #[error("storage error: {0}")]
    Storage(#[from] handoff_storage::StorageError),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
            Self::Transfer(e) => match e {
                TransferError::InvalidToken(_) => "bad_request",
                TransferError::NotFound(_) => "not_found",
                TransferError::Generation(_) | TransferError::Io(_) | TransferError::Store(_) => {
                    "internal_error"
                }
            },
            Self::Metadata(_) | Self::Storage(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transfer(e) => match e {
                TransferError::InvalidToken(_) => StatusCode::BAD_REQUEST,
                TransferError::NotFound(_) => StatusCode::NOT_FOUND,
                TransferError::Generation(_) | TransferError::Io(_) | TransferError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Metadata(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to expose to clients. Internal failures are reported
    /// generically so the response leaks no paths or store contents.
    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_errors_map_to_expected_statuses() {
        let invalid = ApiError::from(TransferError::InvalidToken("bad".to_string()));
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let missing = ApiError::from(TransferError::NotFound("tok".to_string()));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let generation = ApiError::from(TransferError::Generation("entropy".to_string()));
        assert_eq!(generation.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ApiError::Internal("/var/lib/handoff/uploads exploded".to_string());
        assert_eq!(err.public_message(), "internal error");

        let err = ApiError::BadRequest("missing field".to_string());
        assert!(err.public_message().contains("missing field"));
    }
}
