//! File index repository trait.

use crate::error::MetadataResult;
use crate::models::{FileRow, FileSummary};
use async_trait::async_trait;

/// Repository for the `files` index.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Insert a row and return its newly assigned id.
    ///
    /// Ids are monotonic and never reused, even after deletes.
    async fn insert_file(&self, filename: &str, storage_key: &str) -> MetadataResult<i64>;

    /// List every row as `(id, filename)`, ordered by id ascending.
    async fn list_files(&self) -> MetadataResult<Vec<FileSummary>>;

    /// Get a row by id.
    async fn get_file(&self, id: i64) -> MetadataResult<Option<FileRow>>;

    /// Delete a row by id. Returns `false` if no row had that id.
    async fn delete_file(&self, id: i64) -> MetadataResult<bool>;
}
