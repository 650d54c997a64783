//! Server test utilities.

use locker_core::config::AppConfig;
use locker_metadata::{MetadataStore, SqliteStore};
use locker_server::{AppState, create_router};
use locker_storage::{FilesystemBackend, ObjectStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    /// The object store the router writes to.
    pub storage: Arc<dyn ObjectStore>,
    /// The metadata index the router writes to.
    pub metadata: Arc<dyn MetadataStore>,
    _temp_dir: TempDir,
}

/// Real backends rooted in a temp dir.
#[allow(dead_code)]
pub struct TestBackends {
    pub storage: Arc<dyn ObjectStore>,
    pub metadata: Arc<dyn MetadataStore>,
    pub config: AppConfig,
    pub temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestBackends {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let config = AppConfig::for_testing(temp_dir.path());

        let storage: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(temp_dir.path().join("storage"))
                .await
                .expect("Failed to create storage backend"),
        );
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(temp_dir.path().join("files.db"), Duration::from_secs(5))
                .await
                .expect("Failed to create metadata store"),
        );

        Self {
            storage,
            metadata,
            config,
            temp_dir,
        }
    }
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test config.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut backends = TestBackends::new().await;
        adjust(&mut backends.config);
        let storage = backends.storage.clone();
        let metadata = backends.metadata.clone();
        Self::from_parts(backends, storage, metadata)
    }

    /// Create a test server whose router uses the given (possibly wrapped) stores.
    pub fn from_parts(
        backends: TestBackends,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        locker_server::metrics::register_metrics();
        let state = AppState::new(backends.config, storage.clone(), metadata.clone());
        let router = create_router(state.clone());

        Self {
            router,
            state,
            storage,
            metadata,
            _temp_dir: backends.temp_dir,
        }
    }
}
