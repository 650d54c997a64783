//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("file content is empty")]
    EmptyContent,
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
