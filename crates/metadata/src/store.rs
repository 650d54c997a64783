//! Metadata store trait and SQLite implementation.

use crate::error::MetadataResult;
use crate::models::{FileRow, FileSummary};
use crate::repos::FileRepo;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::instrument;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: FileRepo + Send + Sync {
    /// Create the schema if it does not exist yet.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
///
/// Each call checks a connection out of the pool and holds it only for the
/// duration of that call. The connection goes back to the pool when the
/// guard drops, on success and on every error path.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub async fn new(path: impl AsRef<Path>, busy_timeout: Duration) -> MetadataResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            // One writer at a time; concurrent requests queue on the pool
            // instead of failing with "database is locked".
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(path = %path.display(), "Opened SQLite metadata index");
        Ok(store)
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(SCHEMA_SQL).execute(&mut *conn).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

#[async_trait]
impl FileRepo for SqliteStore {
    #[instrument(skip(self))]
    async fn insert_file(&self, filename: &str, storage_key: &str) -> MetadataResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let result =
            sqlx::query("INSERT INTO files (filename, storage_key, created_at) VALUES (?, ?, ?)")
                .bind(filename)
                .bind(storage_key)
                .bind(OffsetDateTime::now_utc())
                .execute(&mut *conn)
                .await?;
        Ok(result.last_insert_rowid())
    }

    #[instrument(skip(self))]
    async fn list_files(&self) -> MetadataResult<Vec<FileSummary>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, FileSummary>("SELECT id, filename FROM files ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn get_file(&self, id: i64) -> MetadataResult<Option<FileRow>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, FileRow>(
            "SELECT id, filename, storage_key, created_at FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn delete_file(&self, id: i64) -> MetadataResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// SQL schema for SQLite.
///
/// AUTOINCREMENT keeps ids from being reused after the highest row is deleted.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    storage_key TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;
