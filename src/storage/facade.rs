//! Storage facade
//!
//! [`Storage`] is the single entry point callers use. Every operation runs
//! the same pipeline before touching the network:
//!
//! 1. Parse the raw path
//! 2. Check its shape (file vs folder, root allowed or not)
//! 3. Validate it against the backend's naming grammar
//! 4. Delegate to the backend through the transport
//!
//! Steps 1-3 fail with [`StorageError::InvalidArgument`] and never issue a
//! request.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::io::{ReadStream, WriteStream};
use super::{Backend, StorageBackend, StorageError, StorageResult};
use crate::listing::Listing;
use crate::path::StoragePath;
use crate::transport::Transport;

/// What an operation needs the path to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    File,
    Folder,
    Any,
}

/// Path-based access to one storage backend
#[derive(Clone)]
pub struct Storage {
    backend: Backend,
    transport: Arc<dyn Transport>,
}

impl Storage {
    /// Create a facade over a backend and a transport
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use remote_storage::storage::{BlobContainer, Storage};
    /// use remote_storage::transport::http::HttpTransport;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let blob = BlobContainer::new("https://acct.blob.core.windows.net", "reports")?;
    /// let storage = Storage::new(blob, Arc::new(HttpTransport::new()));
    /// let cancel = CancellationToken::new();
    ///
    /// let mut listing = storage.list(Some("2024/"), false, &cancel)?;
    /// while let Some(entry) = listing.next().await {
    ///     println!("{}", entry?.path);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(backend: impl Into<Backend>, transport: Arc<dyn Transport>) -> Self {
        let backend = backend.into();
        info!(backend = %backend, "Created storage facade");
        Self { backend, transport }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Parse, shape-check and validate a raw path
    fn prepare(&self, raw: &str, shape: Shape, operation: &str) -> StorageResult<StoragePath> {
        let path = StoragePath::parse(raw);

        match shape {
            Shape::File if path.is_folder() => {
                return Err(StorageError::InvalidArgument(format!(
                    "{} requires a file path, got folder '{}'",
                    operation, path
                )));
            }
            Shape::Folder if !path.is_folder() => {
                return Err(StorageError::InvalidArgument(format!(
                    "{} requires a folder path, got file '{}'",
                    operation, path
                )));
            }
            _ => {}
        }

        if !path.is_root() {
            self.backend.validate_path(&path).map_err(|e| match e {
                StorageError::InvalidArgument(reason) => StorageError::InvalidArgument(format!(
                    "{} of '{}': {}",
                    operation, path, reason
                )),
                other => other,
            })?;
        }

        Ok(path)
    }

    /// Reject the storage root for operations that need a concrete resource
    fn require_non_root(path: &StoragePath, operation: &str) -> StorageResult<()> {
        if path.is_root() {
            return Err(StorageError::InvalidArgument(format!(
                "{} cannot target the storage root",
                operation
            )));
        }
        Ok(())
    }

    /// Check if a file or folder exists
    pub async fn exists(&self, path: &str, cancel: &CancellationToken) -> StorageResult<bool> {
        let path = self.prepare(path, Shape::Any, "exists")?;
        self.backend
            .exists(self.transport.as_ref(), &path, cancel)
            .await
    }

    /// List the entries under a folder
    ///
    /// `None` lists the storage root. When `recurse` is false only immediate
    /// children are returned, with sub-folders as folder entries; otherwise
    /// the whole subtree is returned, each entry carrying its full path.
    ///
    /// The path is checked here; no request is made until the returned
    /// [`Listing`] is advanced.
    pub fn list(
        &self,
        path: Option<&str>,
        recurse: bool,
        cancel: &CancellationToken,
    ) -> StorageResult<Listing> {
        let folder = match path {
            Some(raw) => self.prepare(raw, Shape::Folder, "list")?,
            None => StoragePath::root(),
        };
        debug!(backend = self.backend.kind(), folder = %folder, recurse, "Starting listing");

        Ok(Listing::new(
            self.backend.clone(),
            Arc::clone(&self.transport),
            folder,
            recurse,
            cancel.clone(),
        ))
    }

    /// Open a file for reading; `None` when it does not exist
    pub async fn open_read(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<ReadStream>> {
        let path = self.prepare(path, Shape::File, "open_read")?;
        let content = self
            .backend
            .read(self.transport.as_ref(), &path, cancel)
            .await?;
        Ok(content.map(ReadStream::new))
    }

    /// Open a file for writing
    ///
    /// Fails with [`StorageError::NotSupported`] on backends without a
    /// streaming upload.
    pub fn open_write(&self, path: &str, cancel: &CancellationToken) -> StorageResult<WriteStream> {
        let path = self.prepare(path, Shape::File, "open_write")?;

        if !self.backend.supports_streaming_write() {
            return Err(StorageError::NotSupported(format!(
                "open_write on {} backend",
                self.backend.kind()
            )));
        }

        Ok(WriteStream::new(
            self.backend.clone(),
            Arc::clone(&self.transport),
            path,
            cancel.clone(),
        ))
    }

    /// Read a UTF-8 text file; `None` when it does not exist
    pub async fn read_text(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<String>> {
        let path = self.prepare(path, Shape::File, "read_text")?;
        let Some(content) = self
            .backend
            .read(self.transport.as_ref(), &path, cancel)
            .await?
        else {
            return Ok(None);
        };

        String::from_utf8(content).map(Some).map_err(|e| {
            StorageError::InvalidData(format!("{} is not valid UTF-8: {}", path, e))
        })
    }

    /// Create or replace a UTF-8 text file
    pub async fn write_text(
        &self,
        path: &str,
        contents: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let path = self.prepare(path, Shape::File, "write_text")?;
        self.backend
            .write(
                self.transport.as_ref(),
                &path,
                contents.as_bytes().to_vec(),
                cancel,
            )
            .await
    }

    /// Move a file or folder
    ///
    /// Both paths must be of the same kind. A missing source is
    /// [`StorageError::NotFound`].
    pub async fn rename(
        &self,
        old_path: &str,
        new_path: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let from = self.prepare(old_path, Shape::Any, "rename")?;
        let to = self.prepare(new_path, Shape::Any, "rename")?;
        Self::require_non_root(&from, "rename")?;
        Self::require_non_root(&to, "rename")?;

        if from.is_folder() != to.is_folder() {
            return Err(StorageError::InvalidArgument(format!(
                "rename cannot change '{}' into '{}': file and folder paths differ",
                from, to
            )));
        }

        self.backend
            .rename(self.transport.as_ref(), &from, &to, cancel)
            .await
    }

    /// Delete a file or folder
    ///
    /// `recurse` applies to folders only. A missing path is
    /// [`StorageError::NotFound`].
    pub async fn remove(
        &self,
        path: &str,
        recurse: bool,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let path = self.prepare(path, Shape::Any, "remove")?;
        Self::require_non_root(&path, "remove")?;
        self.backend
            .remove(self.transport.as_ref(), &path, recurse, cancel)
            .await
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}
