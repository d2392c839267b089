//! Application state shared across handlers.

use crate::transfer::TransferService;
use handoff_core::config::AppConfig;
use handoff_metadata::MetadataStore;
use handoff_storage::BlobStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Blob storage backend.
    pub blobs: Arc<dyn BlobStore>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Transfer orchestration over the two stores.
    pub service: Arc<TransferService>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let service = Arc::new(TransferService::new(blobs.clone(), metadata.clone()));
        Self {
            config: Arc::new(config),
            blobs,
            metadata,
            service,
        }
    }
}
