//! Test server wired against real backends in a temporary directory.

use axum::Router;
use handoff_core::config::AppConfig;
use handoff_server::{AppState, create_router};
use tempfile::TempDir;

/// A fully wired application over a filesystem blob store and a SQLite
/// metadata store, both rooted in a per-test temporary directory.
pub struct TestServer {
    pub router: Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

impl TestServer {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let config = AppConfig::for_testing(temp_dir.path());

        let blobs = handoff_storage::from_config(&config.storage)
            .await
            .expect("create blob store");
        let metadata = handoff_metadata::from_config(&config.metadata)
            .await
            .expect("create metadata store");

        let state = AppState::new(config, blobs, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Root directory holding the blob files.
    pub fn uploads_dir(&self) -> std::path::PathBuf {
        self._temp_dir.path().join("uploads")
    }
}
