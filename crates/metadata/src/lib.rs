//! Metadata index for locker.
//!
//! This crate owns the authoritative list of known files:
//! - [`FileRepo`]: insert, list, look up and delete `files` rows
//! - [`MetadataStore`]: repo plus schema setup and health checks
//! - [`SqliteStore`]: the SQLite implementation

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use models::{FileRow, FileSummary};
pub use repos::FileRepo;
pub use store::{MetadataStore, SqliteStore};

use locker_core::config::MetadataConfig;
use std::sync::Arc;
use std::time::Duration;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    config.validate().map_err(MetadataError::Config)?;

    match config {
        MetadataConfig::Sqlite {
            path,
            busy_timeout_secs,
        } => {
            let store = SqliteStore::new(path, Duration::from_secs(*busy_timeout_secs)).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
