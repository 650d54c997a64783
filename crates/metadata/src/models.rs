//! Database models mapping to the `files` table.

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// A full row of the `files` table.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub id: i64,
    /// Sanitized display name.
    pub filename: String,
    /// Key of the blob in the object store.
    pub storage_key: String,
    pub created_at: OffsetDateTime,
}

/// The `(id, filename)` projection returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct FileSummary {
    pub id: i64,
    pub filename: String,
}
