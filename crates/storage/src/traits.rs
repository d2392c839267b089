//! Blob store trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// A borrowed stream of incoming bytes for blob writes.
///
/// Borrowed rather than boxed because upload bodies (e.g. multipart fields)
/// are tied to the lifetime of the surrounding request.
pub type UploadStream<'a> = &'a mut (dyn Stream<Item = StorageResult<Bytes>> + Send + Unpin);

/// Blob store abstraction: one blob per token, keyed by the token itself.
///
/// Kept as a narrow capability interface so an alternative backing (object
/// storage, an in-memory map for tests) can be substituted without touching
/// the transfer service.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Create the blob for `token` from a byte stream.
    ///
    /// The target is opened for exclusive write-or-create: an existing blob
    /// is never truncated or overwritten (`AlreadyExists`). On any failure
    /// mid-copy, the partially written blob is removed before the error
    /// surfaces. Returns the number of bytes written.
    async fn create(&self, token: &str, content: UploadStream<'_>) -> StorageResult<u64>;

    /// Open the blob for `token` as a readable byte stream.
    ///
    /// `NotFound` if no blob exists at the derived path, or if the path
    /// resolves to a directory; tokens never collide with directories, but
    /// a corrupted environment must not be trusted.
    async fn open(&self, token: &str) -> StorageResult<ByteStream>;

    /// Delete the blob for `token`. Idempotent: absence is not an error.
    async fn delete(&self, token: &str) -> StorageResult<()>;

    /// Verify the backend is usable. Called once at startup.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
