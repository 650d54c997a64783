//! Core domain types and shared logic for the locker file registry.
//!
//! This crate defines what every other crate agrees on:
//! - Configuration for the server, object store and metadata index
//! - Filename sanitization and storage key derivation
//! - The core validation error type

pub mod config;
pub mod error;
pub mod filename;

pub use error::{Error, Result};
pub use filename::{STORAGE_KEY_PREFIX, StorageKey, sanitize_filename};

/// Default upper bound on an uploaded file: 100 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;
