//! Failure-injecting wrappers around the real stores.

use async_trait::async_trait;
use bytes::Bytes;
use locker_metadata::{FileRepo, FileRow, FileSummary, MetadataError, MetadataResult, MetadataStore};
use locker_storage::{ObjectStore, StorageError, StorageResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn injected_io_error(op: &str) -> StorageError {
    StorageError::Io(std::io::Error::other(format!("injected {op} failure")))
}

/// Object store that fails selected operations on demand.
#[allow(dead_code)]
pub struct FaultyStore {
    inner: Arc<dyn ObjectStore>,
    pub fail_put: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_delete: AtomicBool,
}

#[allow(dead_code)]
impl FaultyStore {
    pub fn new(inner: Arc<dyn ObjectStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_put: AtomicBool::new(false),
            fail_get: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(injected_io_error("get"));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(injected_io_error("put"));
        }
        self.inner.put(key, data).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected_io_error("delete"));
        }
        self.inner.delete(key).await
    }

    fn backend_name(&self) -> &'static str {
        "faulty"
    }
}

/// Metadata store that fails selected operations on demand.
#[allow(dead_code)]
pub struct FailingMetadata {
    inner: Arc<dyn MetadataStore>,
    pub fail_insert: AtomicBool,
    pub fail_reads: AtomicBool,
}

#[allow(dead_code)]
impl FailingMetadata {
    pub fn new(inner: Arc<dyn MetadataStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_insert: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        })
    }

    fn check_reads(&self) -> MetadataResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(MetadataError::Internal("injected read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FileRepo for FailingMetadata {
    async fn insert_file(&self, filename: &str, storage_key: &str) -> MetadataResult<i64> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(MetadataError::Internal(
                "injected insert failure".to_string(),
            ));
        }
        self.inner.insert_file(filename, storage_key).await
    }

    async fn list_files(&self) -> MetadataResult<Vec<FileSummary>> {
        self.check_reads()?;
        self.inner.list_files().await
    }

    async fn get_file(&self, id: i64) -> MetadataResult<Option<FileRow>> {
        self.check_reads()?;
        self.inner.get_file(id).await
    }

    async fn delete_file(&self, id: i64) -> MetadataResult<bool> {
        self.inner.delete_file(id).await
    }
}

#[async_trait]
impl MetadataStore for FailingMetadata {
    async fn migrate(&self) -> MetadataResult<()> {
        self.inner.migrate().await
    }

    async fn health_check(&self) -> MetadataResult<()> {
        self.check_reads()?;
        self.inner.health_check().await
    }
}
