//! Configuration types shared across crates.

use crate::DEFAULT_MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob storage backend.
    pub storage: StorageConfig,
    /// Metadata store backend.
    pub metadata: MetadataConfig,
}

impl AppConfig {
    /// Create a configuration rooted in the given directory.
    ///
    /// **For testing only.** Places both the blob root and the metadata
    /// database under `root`.
    pub fn for_testing(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::Filesystem {
                path: root.join("uploads"),
            },
            metadata: MetadataConfig::Sqlite {
                path: root.join("handoff.db"),
            },
        }
    }
}

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted upload body size in bytes. Enforced at the HTTP
    /// boundary before the transfer core sees the stream.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Blob storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage, one file per token.
    Filesystem {
        /// Root directory for blobs.
        path: PathBuf,
    },
}

/// Metadata store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// Embedded SQLite database.
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
    },
}
