//! In-memory store implementations with call counters, for exercising the
//! transfer service without touching the filesystem or a database.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use handoff_core::UploadRecord;
use handoff_metadata::{MetadataError, MetadataResult, MetadataStore};
use handoff_storage::{BlobStore, ByteStream, StorageError, StorageResult, UploadStream};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory blob store keyed by token, counting every call.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    pub creates: AtomicUsize,
    pub opens: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create(&self, token: &str, content: UploadStream<'_>) -> StorageResult<u64> {
        self.creates.fetch_add(1, Ordering::SeqCst);

        let mut buf = Vec::new();
        while let Some(chunk) = content.next().await {
            buf.extend_from_slice(&chunk?);
        }

        let mut blobs = self.blobs.lock().unwrap();
        if blobs.contains_key(token) {
            return Err(StorageError::AlreadyExists(token.to_string()));
        }
        let written = buf.len() as u64;
        blobs.insert(token.to_string(), Bytes::from(buf));
        Ok(written)
    }

    async fn open(&self, token: &str) -> StorageResult<ByteStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let blob = self
            .blobs
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(token.to_string()))?;
        Ok(Box::pin(futures::stream::iter([Ok(blob)])))
    }

    async fn delete(&self, token: &str) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.blobs.lock().unwrap().remove(token);
        Ok(())
    }
}

/// Blob store whose deletes take a while, for exercising cleanup futures
/// that get cancelled mid-purge.
pub struct SlowDeleteBlobStore {
    pub inner: MemoryBlobStore,
    delete_delay: Duration,
}

impl SlowDeleteBlobStore {
    pub fn new(delete_delay: Duration) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            delete_delay,
        }
    }
}

#[async_trait]
impl BlobStore for SlowDeleteBlobStore {
    async fn create(&self, token: &str, content: UploadStream<'_>) -> StorageResult<u64> {
        self.inner.create(token, content).await
    }

    async fn open(&self, token: &str) -> StorageResult<ByteStream> {
        self.inner.open(token).await
    }

    async fn delete(&self, token: &str) -> StorageResult<()> {
        tokio::time::sleep(self.delete_delay).await;
        self.inner.delete(token).await
    }
}

/// In-memory metadata store with an injectable put failure.
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: Mutex<HashMap<String, UploadRecord>>,
    pub fail_puts: AtomicBool,
    pub puts: AtomicUsize,
    pub gets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.records.lock().unwrap().contains_key(token)
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn put_record(&self, record: &UploadRecord) -> MetadataResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(MetadataError::Io(std::io::Error::other(
                "injected put failure",
            )));
        }

        let mut records = self.records.lock().unwrap();
        if records.contains_key(record.token.as_str()) {
            return Err(MetadataError::InvalidRecord(format!(
                "duplicate token {}",
                record.token
            )));
        }
        records.insert(record.token.as_str().to_string(), record.clone());
        Ok(())
    }

    async fn get_record(&self, token: &str) -> MetadataResult<Option<UploadRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(token).cloned())
    }

    async fn delete_record(&self, token: &str) -> MetadataResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().remove(token);
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        Ok(())
    }
}
