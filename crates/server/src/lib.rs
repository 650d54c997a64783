//! HTTP server for the locker file registry.
//!
//! This crate provides:
//! - The registry coordinator that keeps the object store and the metadata
//!   index in step
//! - Upload, list, download and delete endpoints under `/api`
//! - Prometheus metrics

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use registry::{Download, FileRecord, Registry, RegistryError, RegistryResult};
pub use routes::create_router;
pub use state::AppState;
