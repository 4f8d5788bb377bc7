//! Storage error types
//!
//! - DuplicateKey: a unique index rejected an insert (client error, 409)
//! - Io / Corrupt / LockPoisoned: store failures (500, details never echoed)
//! - InvalidUri / UnsupportedScheme: connection string problems at startup

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::error;

use crate::api::ErrorSignal;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Document store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Unique index violation
    #[error("Duplicate key in '{collection}': {field} = {value}")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    /// Disk I/O failure
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    /// A persisted line could not be decoded
    #[error("Corrupt document at {path}:{line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Document to insert is not a JSON object
    #[error("Documents must be JSON objects")]
    NotAnObject,

    /// Connection string has no `scheme://`
    #[error("Invalid connection string '{0}'")]
    InvalidUri(String),

    /// Connection string scheme is not served by this store
    #[error("Unsupported connection scheme '{0}' (expected memory:// or file://)")]
    UnsupportedScheme(String),

    /// A collection lock was poisoned by a panicking writer
    #[error("Lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Create an I/O error with context
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        StorageError::Io {
            message: message.into(),
            source,
        }
    }

    /// Whether the caller caused the failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, StorageError::DuplicateKey { .. })
    }
}

impl From<StorageError> for ErrorSignal {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateKey { field, .. } => {
                ErrorSignal::conflict(format!("Duplicate value for unique field '{}'", field))
            }
            other => {
                // Internal details stay in the log only
                error!(error = %other, "storage failure");
                ErrorSignal::unexpected()
            }
        }
    }
}
