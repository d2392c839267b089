//! Transfer service: one-shot upload/download orchestration.
//!
//! Uploads write the blob before the metadata record, so metadata never
//! references a missing blob; a failed record write compensates by deleting
//! the just-written blob. Downloads purge blob and metadata on every exit
//! path: a fully streamed response, a mid-stream failure, or a client that
//! disconnects and drops the stream. An aborted download consumes the token;
//! the disconnecting client is not entitled to a second attempt.

use futures::StreamExt;
use handoff_core::{TransferToken, UploadRecord};
use handoff_metadata::{MetadataError, MetadataStore};
use handoff_storage::{BlobStore, ByteStream, StorageError, UploadStream};
use std::sync::Arc;
use thiserror::Error;

/// Transfer operation errors.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("token generation failed: {0}")]
    Generation(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("blob storage error: {0}")]
    Io(#[from] StorageError),

    #[error("metadata store error: {0}")]
    Store(#[from] MetadataError),
}

/// Result type for transfer operations.
pub type TransferResult<T> = std::result::Result<T, TransferError>;

/// Orchestrates the token-addressed, self-expiring file exchange.
///
/// Store handles are injected at construction so tests can substitute
/// in-memory implementations.
pub struct TransferService {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
}

impl TransferService {
    /// Create a new transfer service over the given stores.
    pub fn new(blobs: Arc<dyn BlobStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { blobs, metadata }
    }

    /// Accept an upload: generate a token, persist the blob, then the record.
    ///
    /// Blob-write failure propagates with no metadata written. Record-write
    /// failure deletes the just-written blob (best-effort, logged) before
    /// propagating, so no orphaned blob survives without a retrievable name.
    pub async fn upload(
        &self,
        original_name: &str,
        content_type: Option<String>,
        content: UploadStream<'_>,
    ) -> TransferResult<TransferToken> {
        let token =
            TransferToken::generate().map_err(|e| TransferError::Generation(e.to_string()))?;

        let written = self.blobs.create(token.as_str(), content).await?;

        let record = UploadRecord::new(token.clone(), original_name.to_string(), content_type);
        if let Err(e) = self.metadata.put_record(&record).await {
            if let Err(del_err) = self.blobs.delete(token.as_str()).await {
                tracing::warn!(
                    token = %token,
                    error = %del_err,
                    "failed to delete blob while compensating for record write failure"
                );
            }
            return Err(TransferError::Store(e));
        }

        tracing::info!(token = %token, bytes = written, name = %original_name, "upload stored");
        Ok(token)
    }

    /// Resolve a token to its one-shot download.
    ///
    /// The raw token is attacker-controlled input: it is validated here
    /// regardless of what the generator guarantees about its own output.
    /// A filesystem that disagrees with metadata answers `NotFound` rather
    /// than leaking the inconsistency as a server error.
    pub async fn download(&self, raw_token: &str) -> TransferResult<Download> {
        let token = TransferToken::parse(raw_token).map_err(|e| match e {
            handoff_core::Error::InvalidToken(msg) => TransferError::InvalidToken(msg),
            other => TransferError::InvalidToken(other.to_string()),
        })?;

        let record = self
            .metadata
            .get_record(token.as_str())
            .await?
            .ok_or_else(|| TransferError::NotFound(token.to_string()))?;

        let stream = match self.blobs.open(token.as_str()).await {
            Ok(stream) => stream,
            Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {
                tracing::warn!(token = %token, "record present but blob missing");
                return Err(TransferError::NotFound(token.to_string()));
            }
            Err(e) => return Err(TransferError::Io(e)),
        };

        let guard = CleanupGuard {
            blobs: self.blobs.clone(),
            metadata: self.metadata.clone(),
            token: token.as_str().to_string(),
            armed: true,
        };

        Ok(Download {
            original_name: record.original_name,
            content_type: record.content_type,
            stream,
            guard,
        })
    }
}

/// A resolved one-shot download: response metadata plus the blob stream.
///
/// Consuming the stream to completion purges blob and metadata inline;
/// dropping it early purges them from a background task. Either way the
/// token resolves to `NotFound` afterwards.
pub struct Download {
    /// Original filename for the attachment header.
    pub original_name: String,
    /// Content type declared at upload time, if any.
    pub content_type: Option<String>,
    stream: ByteStream,
    guard: CleanupGuard,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("original_name", &self.original_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl Download {
    /// Turn the download into the response byte stream.
    pub fn into_stream(self) -> ByteStream {
        let Download {
            stream: inner,
            guard,
            ..
        } = self;

        Box::pin(async_stream::try_stream! {
            let mut inner = inner;
            while let Some(chunk) = inner.next().await {
                // A mid-stream read error ends the generator here; the
                // guard's drop handler still runs the purge.
                let chunk = chunk?;
                yield chunk;
            }
            guard.run().await;
        })
    }
}

/// Purges a token's blob and record when a download ends on any path.
///
/// `run` executes the purge inline, disarming only after it completes; if
/// the guard is dropped while armed (stream abandoned mid-flight, or `run`
/// itself cancelled mid-purge), the purge is spawned onto the runtime.
struct CleanupGuard {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    token: String,
    armed: bool,
}

impl CleanupGuard {
    async fn run(mut self) {
        // Disarm only once the purge has finished: if this future is
        // cancelled mid-purge, the drop handler respawns it. The deletes
        // are idempotent, so running the purge twice is harmless.
        purge(self.blobs.clone(), self.metadata.clone(), self.token.clone()).await;
        self.armed = false;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let token = std::mem::take(&mut self.token);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(purge(self.blobs.clone(), self.metadata.clone(), token));
            }
            Err(_) => {
                tracing::warn!(token = %token, "download dropped outside a runtime, purge skipped");
            }
        }
    }
}

/// Best-effort deletion of a token's blob and record. Failures are logged,
/// never propagated: cleanup must not block a response the client has
/// already started receiving.
async fn purge(blobs: Arc<dyn BlobStore>, metadata: Arc<dyn MetadataStore>, token: String) {
    if let Err(e) = blobs.delete(&token).await {
        tracing::warn!(token = %token, error = %e, "failed to delete blob during download cleanup");
    }
    if let Err(e) = metadata.delete_record(&token).await {
        tracing::warn!(token = %token, error = %e, "failed to delete record during download cleanup");
    }
    tracing::debug!(token = %token, "token consumed");
}
