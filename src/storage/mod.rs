//! Storage backend abstraction
//!
//! Defines the [`StorageBackend`] trait, the closed [`Backend`] set of
//! supported providers, and the [`Storage`] facade callers use:
//! - [`BlobContainer`]: hierarchical blob container (XML listings)
//! - [`Workspace`]: workspace filesystem REST API (JSON listings)

use crate::validation::ValidationError;

pub mod backend;
pub mod blob;
pub mod facade;
pub mod io;
pub mod workspace;

pub use backend::{Backend, StorageBackend};
pub use blob::BlobContainer;
pub use facade::Storage;
pub use io::{ReadStream, WriteStream};
pub use workspace::Workspace;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Malformed path, wrong path kind, or a name the backend would reject.
    /// Always raised before any request is sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Non-success response, with the backend's raw status and message
    #[error("Transport failure (HTTP {status}): {message}")]
    Transport { status: u16, message: String },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::InvalidArgument(err.to_string())
    }
}
