//! Application state shared across handlers.

use crate::registry::Registry;
use locker_core::config::AppConfig;
use locker_metadata::MetadataStore;
use locker_storage::ObjectStore;
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup.
    pub config: Arc<AppConfig>,
    /// Coordinator for every file operation.
    pub registry: Registry,
    /// Metadata index, used directly only for health checks.
    pub metadata: Arc<dyn MetadataStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry: Registry::new(storage, metadata.clone()),
            metadata,
        }
    }
}
