//! Remote Storage SDK - uniform path-based access to remote storage
//!
//! Provides:
//! - A canonical path model shared by every backend
//! - Per-backend naming validation, applied before any request is sent
//! - Lazy, paginated listings folded into one entry model
//! - A storage facade (exists, list, read, write, rename, remove)
//!
//! Supported backends: hierarchical blob containers and workspace filesystems.

pub mod config;
pub mod listing;
pub mod models;
pub mod path;
pub mod storage;
pub mod transport;
pub mod validation;

// Re-export commonly used types
pub use config::StorageConfig;
pub use listing::{Listing, Page, PageCursor};
pub use models::Entry;
pub use path::StoragePath;
pub use storage::{
    Backend, BlobContainer, ReadStream, Storage, StorageBackend, StorageError, StorageResult,
    Workspace, WriteStream,
};
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
#[cfg(feature = "http-transport")]
pub use transport::http::HttpTransport;
pub use validation::{
    ValidationError, is_valid_container_name, is_valid_resource_name, is_valid_workspace_path,
};
