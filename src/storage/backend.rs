//! Backend trait and the closed set of supported backends

use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

use super::{BlobContainer, StorageResult, Workspace};
use crate::listing::{Page, PageCursor};
use crate::path::StoragePath;
use crate::transport::{HttpRequest, Transport};

/// Trait for storage backends
///
/// A backend owns its naming grammar, the shape of its listing requests and
/// responses, and the requests behind every facade operation. Paths handed to
/// these methods have already been parsed, shape-checked and validated by the
/// facade.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name used in logs and errors
    fn kind(&self) -> &'static str;

    /// Check a non-root path against the backend's naming grammar
    fn validate_path(&self, path: &StoragePath) -> StorageResult<()>;

    /// Build the request for one listing page
    fn list_page_request(&self, cursor: &PageCursor, recurse: bool) -> HttpRequest;

    /// Convert one listing page response body
    fn parse_list_page(
        &self,
        cursor: &PageCursor,
        recurse: bool,
        body: &[u8],
    ) -> StorageResult<Page>;

    /// Whether [`StorageBackend::write`] may be driven by a streaming writer
    fn supports_streaming_write(&self) -> bool;

    /// Whether a 404 listing page means an empty folder rather than a failure
    fn missing_listing_is_empty(&self) -> bool;

    /// Check if a file or folder exists
    async fn exists(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<bool>;

    /// Read a file; `None` when it does not exist
    async fn read(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Vec<u8>>>;

    /// Create or replace a file
    async fn write(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        content: Vec<u8>,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Move a file or folder
    async fn rename(
        &self,
        transport: &dyn Transport,
        from: &StoragePath,
        to: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Delete a file or folder
    async fn remove(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        recurse: bool,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;
}

/// Supported backends, chosen when the facade is built
#[derive(Clone)]
pub enum Backend {
    Blob(BlobContainer),
    Workspace(Workspace),
}

impl Backend {
    fn inner(&self) -> &dyn StorageBackend {
        match self {
            Backend::Blob(blob) => blob,
            Backend::Workspace(workspace) => workspace,
        }
    }
}

impl From<BlobContainer> for Backend {
    fn from(blob: BlobContainer) -> Self {
        Backend::Blob(blob)
    }
}

impl From<Workspace> for Backend {
    fn from(workspace: Workspace) -> Self {
        Backend::Workspace(workspace)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Blob(blob) => write!(f, "{}", blob),
            Backend::Workspace(workspace) => write!(f, "{}", workspace),
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Backend({})", self)
    }
}

#[async_trait]
impl StorageBackend for Backend {
    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn validate_path(&self, path: &StoragePath) -> StorageResult<()> {
        self.inner().validate_path(path)
    }

    fn list_page_request(&self, cursor: &PageCursor, recurse: bool) -> HttpRequest {
        self.inner().list_page_request(cursor, recurse)
    }

    fn parse_list_page(
        &self,
        cursor: &PageCursor,
        recurse: bool,
        body: &[u8],
    ) -> StorageResult<Page> {
        self.inner().parse_list_page(cursor, recurse, body)
    }

    fn supports_streaming_write(&self) -> bool {
        self.inner().supports_streaming_write()
    }

    fn missing_listing_is_empty(&self) -> bool {
        self.inner().missing_listing_is_empty()
    }

    async fn exists(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        self.inner().exists(transport, path, cancel).await
    }

    async fn read(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Vec<u8>>> {
        self.inner().read(transport, path, cancel).await
    }

    async fn write(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        content: Vec<u8>,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.inner().write(transport, path, content, cancel).await
    }

    async fn rename(
        &self,
        transport: &dyn Transport,
        from: &StoragePath,
        to: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.inner().rename(transport, from, to, cancel).await
    }

    async fn remove(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        recurse: bool,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.inner().remove(transport, path, recurse, cancel).await
    }
}
