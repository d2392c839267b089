//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use async_trait::async_trait;
use handoff_core::{TransferToken, UploadRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::instrument;

/// Durable mapping from token to upload record.
///
/// Backed by a transactional key-value primitive with a single named
/// collection; every operation is single-key.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist the record for a fresh upload within a single transaction.
    ///
    /// Tokens are write-once: inserting a token that already has a record
    /// is a store error, never a silent overwrite.
    async fn put_record(&self, record: &UploadRecord) -> MetadataResult<()>;

    /// Look up the record for a token.
    ///
    /// Returns `None` when the key is unset, the normal unknown or
    /// already-consumed token case, distinct from a database failure.
    async fn get_record(&self, token: &str) -> MetadataResult<Option<UploadRecord>>;

    /// Remove the record for a token. Idempotent: absence is not an error.
    async fn delete_record(&self, token: &str) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store, running migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under concurrent requests.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS upload_records (
                token TEXT PRIMARY KEY,
                original_name TEXT NOT NULL,
                content_type TEXT,
                created_at TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    #[instrument(skip(self, record), fields(token = %record.token))]
    async fn put_record(&self, record: &UploadRecord) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO upload_records (token, original_name, content_type, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(record.token.as_str())
        .bind(&record.original_name)
        .bind(&record.content_type)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_record(&self, token: &str) -> MetadataResult<Option<UploadRecord>> {
        let row: Option<(String, String, Option<String>, OffsetDateTime)> = sqlx::query_as(
            "SELECT token, original_name, content_type, created_at
             FROM upload_records WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(token, original_name, content_type, created_at)| {
            let token = TransferToken::parse(&token)
                .map_err(|e| MetadataError::InvalidRecord(e.to_string()))?;
            Ok(UploadRecord {
                token,
                original_name,
                content_type,
                created_at,
            })
        })
        .transpose()
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, token: &str) -> MetadataResult<()> {
        sqlx::query("DELETE FROM upload_records WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
