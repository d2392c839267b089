//! Upload record metadata.

use crate::token::TransferToken;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Metadata associated with one uploaded blob.
///
/// Created atomically with the blob during upload, read once during
/// download, deleted after the download completes or is abandoned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadRecord {
    /// The token addressing this upload.
    pub token: TransferToken,
    /// Original filename, replayed in the download's attachment header.
    pub original_name: String,
    /// Content type declared at upload time (if any).
    pub content_type: Option<String>,
    /// When the upload was accepted.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UploadRecord {
    /// Create a record for a fresh upload, timestamped now.
    pub fn new(token: TransferToken, original_name: String, content_type: Option<String>) -> Self {
        Self {
            token,
            original_name,
            content_type,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Response body for a successful upload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Token to hand to the downloading party.
    pub token: String,
}
