//! Upload and download handlers: the HTTP boundary over the transfer service.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use handoff_core::record::UploadResponse;
use handoff_storage::StorageError;
use serde::Deserialize;

/// Content type served when the upload declared none.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Filename used when the multipart field carries none.
const FALLBACK_FILENAME: &str = "upload";

/// POST /api/upload - Accept a file and store it for one-shot retrieval.
///
/// Expects `multipart/form-data` with a `file` field. The body size cap is
/// enforced by the router's `DefaultBodyLimit` before this handler streams
/// anything. Responds `201` with the transfer token.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());

        // Bridge the multipart field into the blob store's stream type; a
        // client disconnect mid-body surfaces as an I/O error and the store
        // discards the partial blob.
        let mut content = Box::pin(async_stream::try_stream! {
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
            {
                yield chunk;
            }
        });

        let token = state
            .service
            .upload(&original_name, content_type, &mut content)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                token: token.to_string(),
            }),
        ));
    }

    Err(ApiError::BadRequest(
        "multipart body has no 'file' field".to_string(),
    ))
}

/// Query parameters for downloads.
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    /// The transfer token, untrusted caller input.
    token: Option<String>,
}

/// GET /api/download?token=... - One-shot retrieval of an uploaded file.
///
/// Streams the blob with an attachment header carrying the original
/// filename, then purges blob and metadata. A repeat request with the same
/// token is `404`.
pub async fn download_file(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> ApiResult<Response> {
    let raw_token = params.token.as_deref().unwrap_or("").trim();

    let download = state.service.download(raw_token).await?;

    let content_type = download
        .content_type
        .clone()
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
    let disposition = attachment_disposition(&download.original_name);

    let body_stream = download
        .into_stream()
        .map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(body_stream),
    )
        .into_response())
}

/// Build a `Content-Disposition: attachment` value for a stored filename.
///
/// Quotes the filename and strips characters that would break out of the
/// quoted string or inject headers.
fn attachment_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | '\r' | '\n') && !c.is_control())
        .collect();
    let safe = if safe.is_empty() {
        FALLBACK_FILENAME
    } else {
        safe.as_str()
    };
    format!("attachment; filename=\"{safe}\"")
}
