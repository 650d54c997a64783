//! Filename sanitization and storage key derivation.
//!
//! Uploaded filenames are untrusted. Before a name is stored in the index or
//! used to address a blob it passes through [`sanitize_filename`], which maps
//! it onto a flat, portable name. The storage key is then derived from the
//! sanitized name alone, so identical names always map to the same key.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Prefix under which every uploaded blob is stored.
pub const STORAGE_KEY_PREFIX: &str = "uploads/";

/// Longest sanitized filename accepted, in bytes.
pub const MAX_FILENAME_LEN: usize = 255;

/// Device names that Windows refuses to open as regular files.
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduce a user-supplied filename to a safe, flat name.
///
/// Rules, applied in order:
/// 1. `/` and `\` become spaces, so directory parts turn into words.
/// 2. The name is NFKD-normalized and non-ASCII characters are dropped, so
///    accented letters fold to their base letter (`é` becomes `e`).
/// 3. Whitespace runs collapse and the remaining words are joined with `_`.
/// 4. Only ASCII letters, digits, `_`, `.` and `-` are kept.
/// 5. Leading and trailing `.` and `_` are stripped.
/// 6. Windows device names (`CON`, `LPT1.txt`, ...) get a leading `_`.
///
/// Returns [`Error::InvalidFilename`](crate::Error::InvalidFilename) when
/// nothing survives or the result is longer than [`MAX_FILENAME_LEN`].
pub fn sanitize_filename(raw: &str) -> crate::Result<String> {
    let spaced: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if matches!(c, '/' | '\\') { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return Err(crate::Error::InvalidFilename(format!(
            "{raw:?} contains no usable characters"
        )));
    }

    let sanitized = if is_windows_device_name(trimmed) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    };

    if sanitized.len() > MAX_FILENAME_LEN {
        return Err(crate::Error::InvalidFilename(format!(
            "filename is {} bytes after sanitization (max {MAX_FILENAME_LEN})",
            sanitized.len()
        )));
    }

    Ok(sanitized)
}

fn is_windows_device_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    WINDOWS_DEVICE_NAMES
        .iter()
        .any(|device| device.eq_ignore_ascii_case(stem))
}

/// Key addressing a blob in the object store.
///
/// Keys are derived from sanitized filenames only, never from ids. Two uploads
/// with the same sanitized filename therefore share a key and the later write
/// replaces the earlier blob while both index rows remain.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for an already sanitized filename.
    pub fn for_filename(sanitized: &str) -> Self {
        Self(format!("{STORAGE_KEY_PREFIX}{sanitized}"))
    }

    /// Wrap a key previously read back from the metadata index.
    pub fn from_stored(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({self})")
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
