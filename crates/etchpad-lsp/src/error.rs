//! LSP sync error types.

use etchpad_fs::FsError;
use thiserror::Error;

/// Result type for LSP sync operations.
pub type LspResult<T> = Result<T, LspError>;

/// Errors that can occur while mirroring documents to a language client.
#[derive(Debug, Error)]
pub enum LspError {
    /// A file name could not be turned into a document URI.
    #[error("Invalid URI for {name}: {message}")]
    InvalidUri {
        name: String,
        message: String,
    },

    /// Reading a document's content from the file system failed.
    #[error("Failed to read {name}: {source}")]
    DocumentRead {
        name: String,
        #[source]
        source: FsError,
    },

    /// The language client refused a document notification.
    #[error("Client rejected notification: {0}")]
    ClientRejected(String),

    /// One or more document updates failed within a single sync pass.
    ///
    /// The pass still ran to the end; each failure names the file it
    /// belongs to.
    #[error("{} document update(s) failed in one sync pass", .failures.len())]
    Cycle { failures: Vec<SyncFailure> },
}

impl LspError {
    /// Create an invalid URI error.
    pub fn invalid_uri(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUri {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a client rejection error.
    pub fn client_rejected(message: impl Into<String>) -> Self {
        Self::ClientRejected(message.into())
    }
}

/// A single file's failure inside a sync pass.
#[derive(Debug)]
pub struct SyncFailure {
    /// The file whose update failed.
    pub name: String,
    /// What went wrong.
    pub error: LspError,
}

impl std::fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}
