//! File registry coordinator.
//!
//! Sequences every operation across the object store and the metadata index.
//! The two stores are updated by separate, non-transactional calls:
//!
//! - Upload writes the blob first and inserts the index row only after the
//!   write succeeded. An insert failure leaves an orphan object.
//! - Delete removes the index row first and the blob second. A blob delete
//!   failure leaves an orphan object, never an orphan index row.
//! - Download treats a missing blob behind an existing row as
//!   [`RegistryError::ObjectMissing`], distinct from an unknown id.
//!
//! Nothing here retries or compensates. Orphan objects are logged and
//! counted so an operator can reconcile them out of band.

use crate::metrics;
use bytes::Bytes;
use locker_core::{StorageKey, sanitize_filename};
use locker_metadata::{FileRepo, FileSummary, MetadataError, MetadataStore};
use locker_storage::{ObjectStore, StorageError};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Registry operation errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid input: {0}")]
    Validation(#[from] locker_core::Error),

    #[error("file {0} not found")]
    NotFound(i64),

    #[error("file {id} is indexed but its object {storage_key} is missing from storage")]
    ObjectMissing { id: i64, storage_key: String },

    #[error("failed to write object: {0}")]
    StorageWrite(#[source] StorageError),

    #[error("failed to read object: {0}")]
    StorageRead(#[source] StorageError),

    #[error("index entry for {filename} was deleted but its object could not be removed: {source}")]
    StorageDelete {
        filename: String,
        source: StorageError,
    },

    #[error("failed to write index: {0}")]
    IndexWrite(#[source] MetadataError),

    #[error("failed to read index: {0}")]
    IndexRead(#[source] MetadataError),
}

impl RegistryError {
    /// Short label used for metrics and API error codes.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::ObjectMissing { .. } => "object_missing",
            Self::StorageWrite(_) => "storage_write",
            Self::StorageRead(_) => "storage_read",
            Self::StorageDelete { .. } => "storage_delete",
            Self::IndexWrite(_) => "index_write",
            Self::IndexRead(_) => "index_read",
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// A file known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    /// Sanitized filename.
    pub filename: String,
    pub storage_key: StorageKey,
}

/// Content and name of a downloaded file.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub content: Bytes,
}

/// Coordinates the object store and the metadata index.
#[derive(Clone)]
pub struct Registry {
    storage: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
}

impl Registry {
    pub fn new(storage: Arc<dyn ObjectStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { storage, metadata }
    }

    /// Store `content` under a key derived from the sanitized `filename`,
    /// then index it.
    ///
    /// A previous blob with the same sanitized name is overwritten, while its
    /// index row stays in place and now refers to the new content.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload(&self, filename: &str, content: Bytes) -> RegistryResult<FileRecord> {
        let result = self.upload_inner(filename, content).await;
        if let Err(e) = &result {
            metrics::record_operation_error("upload", e.error_type());
        }
        result
    }

    async fn upload_inner(&self, filename: &str, content: Bytes) -> RegistryResult<FileRecord> {
        let filename = sanitize_filename(filename)?;
        if content.is_empty() {
            return Err(locker_core::Error::EmptyContent.into());
        }
        let storage_key = StorageKey::for_filename(&filename);
        let size = content.len() as u64;

        self.storage
            .put(storage_key.as_str(), content)
            .await
            .map_err(RegistryError::StorageWrite)?;

        let id = match self
            .metadata
            .insert_file(&filename, storage_key.as_str())
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    storage_key = %storage_key,
                    error = %e,
                    "Index insert failed after object write; object is orphaned"
                );
                metrics::record_orphan("object");
                return Err(RegistryError::IndexWrite(e));
            }
        };

        metrics::UPLOADS.inc();
        metrics::BYTES_UPLOADED.inc_by(size);
        info!(id, storage_key = %storage_key, size, "File uploaded");

        Ok(FileRecord {
            id,
            filename,
            storage_key,
        })
    }

    /// List every indexed file, ordered by id.
    ///
    /// Does not touch the object store, so orphan index rows are listed too.
    pub async fn list(&self) -> RegistryResult<Vec<FileSummary>> {
        let files = self.metadata.list_files().await.map_err(|e| {
            metrics::record_operation_error("list", "index_read");
            RegistryError::IndexRead(e)
        })?;
        debug!(count = files.len(), "Listed files");
        Ok(files)
    }

    /// Fetch the content and filename of file `id`.
    #[instrument(skip(self))]
    pub async fn download(&self, id: i64) -> RegistryResult<Download> {
        let result = self.download_inner(id).await;
        if let Err(e) = &result {
            metrics::record_operation_error("download", e.error_type());
        }
        result
    }

    async fn download_inner(&self, id: i64) -> RegistryResult<Download> {
        let row = self
            .metadata
            .get_file(id)
            .await
            .map_err(RegistryError::IndexRead)?
            .ok_or(RegistryError::NotFound(id))?;

        let fetched = self.storage.get(&row.storage_key).await;
        let content = match fetched {
            Ok(content) => content,
            Err(StorageError::NotFound(_)) => {
                warn!(
                    id,
                    storage_key = %row.storage_key,
                    "Index row has no backing object"
                );
                metrics::record_orphan("metadata");
                return Err(RegistryError::ObjectMissing {
                    id,
                    storage_key: row.storage_key,
                });
            }
            Err(e) => return Err(RegistryError::StorageRead(e)),
        };

        metrics::DOWNLOADS.inc();
        Ok(Download {
            filename: row.filename,
            content,
        })
    }

    /// Remove file `id` from the index, then delete its object.
    ///
    /// If the object delete fails the index row stays deleted and
    /// [`RegistryError::StorageDelete`] is returned. An object that is
    /// already gone counts as deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> RegistryResult<FileRecord> {
        let result = self.delete_inner(id).await;
        if let Err(e) = &result {
            metrics::record_operation_error("delete", e.error_type());
        }
        result
    }

    async fn delete_inner(&self, id: i64) -> RegistryResult<FileRecord> {
        let row = self
            .metadata
            .get_file(id)
            .await
            .map_err(RegistryError::IndexRead)?
            .ok_or(RegistryError::NotFound(id))?;

        let removed = self
            .metadata
            .delete_file(id)
            .await
            .map_err(RegistryError::IndexWrite)?;
        if !removed {
            // Lost a race with a concurrent delete of the same id.
            return Err(RegistryError::NotFound(id));
        }
        metrics::DELETES.inc();

        let storage_key = StorageKey::from_stored(row.storage_key);
        match self.storage.delete(storage_key.as_str()).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                warn!(id, storage_key = %storage_key, "Object already absent on delete");
            }
            Err(e) => {
                warn!(
                    id,
                    storage_key = %storage_key,
                    error = %e,
                    "Index row deleted but object delete failed; object is orphaned"
                );
                metrics::record_orphan("object");
                return Err(RegistryError::StorageDelete {
                    filename: row.filename,
                    source: e,
                });
            }
        }

        info!(id, storage_key = %storage_key, "File deleted");
        Ok(FileRecord {
            id,
            filename: row.filename,
            storage_key,
        })
    }
}
