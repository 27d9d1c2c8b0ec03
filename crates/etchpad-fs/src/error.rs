//! File system error types.

use thiserror::Error;

/// Result type for file system operations.
pub type FsResult<T> = Result<T, FsError>;

/// Errors that can occur during file system operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A file with this name already exists.
    #[error("File already exists: {0}")]
    FileExists(String),

    /// File name is not acceptable.
    #[error("Invalid file name {name:?}: {reason}")]
    InvalidName {
        name: String,
        reason: &'static str,
    },

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FsError {
    /// Create a storage backend error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }
}
