//! Error types for the storage layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! I/O and [`serde_json`] errors with context about which operation failed.

use std::path::PathBuf;

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A file-system operation failed.
    #[error("storage I/O error at {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key cannot be used as a storage key.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The payload's top level is not a JSON object.
    #[error("snapshot payload is not a JSON object")]
    NotAnObject,

    /// The payload was written by a newer format than this build reads.
    #[error("unsupported snapshot version {found} (newest supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the payload.
        found: u32,
        /// Newest version this build understands.
        supported: u32,
    },
}

impl DbError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
