//! Blob storage abstraction and backends for Handoff.
//!
//! This crate provides:
//! - The `BlobStore` capability trait (create / open / delete)
//! - A local filesystem backend, one file per token, with path-safety
//!   enforcement

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::{BlobStore, ByteStream, UploadStream};

use handoff_core::config::StorageConfig;
use std::sync::Arc;

/// Create a blob store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::StreamExt;
    use handoff_core::config::StorageConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn from_config_filesystem_ok() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::Filesystem {
            path: temp.path().join("uploads"),
        };

        let store = from_config(&config).await.unwrap();
        store
            .create(
                "abc123",
                &mut futures::stream::iter([Ok(Bytes::from_static(b"hi"))]),
            )
            .await
            .unwrap();

        let mut stream = store.open("abc123").await.unwrap();
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk, Bytes::from_static(b"hi"));
    }
}
