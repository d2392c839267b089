//! Local filesystem blob storage.

use crate::error::{StorageError, StorageResult};
use crate::traits::{BlobStore, ByteStream, UploadStream};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::instrument;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Filesystem blob store: a flat directory with one file per token.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend, creating the root if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Derive the blob path for a token.
    ///
    /// Tokens are validated upstream before the store is invoked; this
    /// re-check is defense-in-depth against traversal outside the root,
    /// not the primary guarantee.
    fn blob_path(&self, token: &str) -> StorageResult<PathBuf> {
        if token.is_empty() {
            return Err(StorageError::InvalidKey("empty token".to_string()));
        }
        if token
            .bytes()
            .any(|b| matches!(b, b'/' | b'\\' | b'.') || b.is_ascii_control())
        {
            return Err(StorageError::InvalidKey(format!(
                "token contains path characters: {token}"
            )));
        }
        // A clean token is a single normal path component.
        let mut components = Path::new(token).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => {}
            _ => {
                return Err(StorageError::InvalidKey(format!(
                    "token is not a single path component: {token}"
                )));
            }
        }
        Ok(self.root.join(token))
    }
}

#[async_trait]
impl BlobStore for FilesystemBackend {
    #[instrument(skip(self, content), fields(backend = "filesystem"))]
    async fn create(&self, token: &str, content: UploadStream<'_>) -> StorageResult<u64> {
        let path = self.blob_path(token)?;

        // Exclusive create: never truncate an existing blob for an
        // in-flight token.
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    StorageError::AlreadyExists(token.to_string())
                } else {
                    StorageError::Io(e)
                }
            })?;

        let mut written: u64 = 0;
        let result: StorageResult<()> = async {
            while let Some(chunk) = content.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.sync_all().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            // No orphaned partial blobs: remove before surfacing the error.
            drop(file);
            if let Err(rm_err) = fs::remove_file(&path).await {
                tracing::warn!(
                    token = %token,
                    error = %rm_err,
                    "failed to remove partial blob after write failure"
                );
            }
            return Err(e);
        }

        Ok(written)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn open(&self, token: &str) -> StorageResult<ByteStream> {
        let path = self.blob_path(token)?;

        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(token.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        if meta.is_dir() {
            return Err(StorageError::NotFound(token.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(token.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        // Stream the file in chunks instead of loading it into memory.
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, token: &str) -> StorageResult<()> {
        let path = self.blob_path(token)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Config(format!(
                "storage root is not a directory: {}",
                self.root.display()
            )));
        }

        Ok(())
    }
}
