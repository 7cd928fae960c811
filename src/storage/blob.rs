//! Blob container backend
//!
//! Implements StorageBackend for a hierarchical blob container addressed as
//! `{account_url}/{container}/{path}`.
//!
//! ## Naming
//!
//! The container name is validated when the backend is created. Every path
//! segment is validated as a resource name before any request is sent.
//!
//! ## Credentials
//!
//! An optional shared-access signature is appended to every URL. It is never
//! logged and is hidden from `Debug` and `Display`.

use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{StorageBackend, StorageError, StorageResult};
use crate::listing::{Page, PageCursor, parse_blob_listing};
use crate::path::StoragePath;
use crate::transport::{HttpRequest, Method, Transport, send_cancellable};
use crate::validation::{validate_container_name, validate_resource_name};

/// Blob container storage backend
#[derive(Clone)]
pub struct BlobContainer {
    account_url: String,
    container: String,
    sas_token: Option<String>,
}

impl BlobContainer {
    /// Create a new blob container backend
    ///
    /// # Arguments
    ///
    /// * `account_url` - Account endpoint (e.g., "https://myaccount.blob.core.windows.net")
    /// * `container` - Container name, validated against the container naming rules
    ///
    /// # Example
    ///
    /// ```rust
    /// use remote_storage::storage::BlobContainer;
    ///
    /// let blob = BlobContainer::new("https://acct.blob.core.windows.net", "reports").unwrap();
    /// assert!(BlobContainer::new("https://acct.blob.core.windows.net", "bad--name").is_err());
    /// ```
    pub fn new(
        account_url: impl Into<String>,
        container: impl Into<String>,
    ) -> StorageResult<Self> {
        let container = container.into();
        validate_container_name(&container)?;

        let account_url = account_url.into().trim_end_matches('/').to_string();
        info!(account_url = %account_url, container = %container, "Created blob container backend");

        Ok(Self {
            account_url,
            container,
            sas_token: None,
        })
    }

    /// Append a shared-access signature to every request URL
    pub fn with_sas_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.sas_token = Some(token.trim_start_matches('?').to_string());
        self
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    fn container_url(&self) -> String {
        format!("{}/{}", self.account_url, self.container)
    }

    fn resource_url(&self, path: &StoragePath) -> String {
        format!("{}/{}", self.container_url(), encode_path(path))
    }

    /// Append query parameters and the signature, if any
    fn with_query(&self, base: String, params: &[(&str, String)]) -> String {
        let mut query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();

        if let Some(ref sas) = self.sas_token {
            query.push(sas.clone());
        }

        if query.is_empty() {
            base
        } else {
            format!("{}?{}", base, query.join("&"))
        }
    }

    fn listing_params(folder: &StoragePath, recurse: bool) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("restype", "container".to_string()),
            ("comp", "list".to_string()),
        ];
        if !folder.is_root() {
            params.push(("prefix", format!("{}/", folder.relative())));
        }
        if !recurse {
            params.push(("delimiter", "/".to_string()));
        }
        params
    }
}

/// Percent-encode each segment, keeping separators
fn encode_path(path: &StoragePath) -> String {
    path.segments()
        .iter()
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for BlobContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}/{}", self.account_url, self.container)
    }
}

impl fmt::Debug for BlobContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobContainer")
            .field("account_url", &self.account_url)
            .field("container", &self.container)
            .field("sas_token", &self.sas_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl StorageBackend for BlobContainer {
    fn kind(&self) -> &'static str {
        "blob"
    }

    fn validate_path(&self, path: &StoragePath) -> StorageResult<()> {
        for prefix in path.prefixes() {
            validate_resource_name(&prefix)?;
        }
        Ok(())
    }

    fn list_page_request(&self, cursor: &PageCursor, recurse: bool) -> HttpRequest {
        let mut params = Self::listing_params(&cursor.folder, recurse);
        if let Some(ref marker) = cursor.marker {
            params.push(("marker", marker.clone()));
        }
        HttpRequest::get(self.with_query(self.container_url(), &params))
    }

    fn parse_list_page(
        &self,
        cursor: &PageCursor,
        _recurse: bool,
        body: &[u8],
    ) -> StorageResult<Page> {
        let xml = std::str::from_utf8(body).map_err(|e| {
            StorageError::SerializationError(format!("Listing is not valid UTF-8: {}", e))
        })?;
        let listing = parse_blob_listing(xml)?;

        Ok(Page {
            entries: listing.entries,
            next: listing
                .next_marker
                .map(|marker| PageCursor::resume(cursor.folder.clone(), marker))
                .into_iter()
                .collect(),
        })
    }

    fn supports_streaming_write(&self) -> bool {
        true
    }

    // Prefix listings never 404; a 404 means the container itself is missing
    fn missing_listing_is_empty(&self) -> bool {
        false
    }

    async fn exists(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        let url = if path.is_root() {
            self.with_query(self.container_url(), &[("restype", "container".to_string())])
        } else {
            self.with_query(self.resource_url(path), &[])
        };
        let response =
            send_cancellable(transport, HttpRequest::new(Method::Head, url), cancel).await?;

        if response.is_success() {
            return Ok(true);
        }
        if !response.is_not_found() {
            return Err(response.into_error(&format!("Existence check for {} failed", path)));
        }
        if !path.is_folder() || path.is_root() {
            return Ok(false);
        }

        // Flat namespaces have no directory blobs; a folder exists while it has children
        let mut params = Self::listing_params(path, true);
        params.push(("maxresults", "1".to_string()));
        let request = HttpRequest::get(self.with_query(self.container_url(), &params));
        let response = send_cancellable(transport, request, cancel).await?;

        if response.is_not_found() {
            return Ok(false);
        }
        if !response.is_success() {
            return Err(response.into_error(&format!("Existence check for {} failed", path)));
        }

        let cursor = PageCursor::start(path.clone());
        let page = self.parse_list_page(&cursor, true, &response.body)?;
        Ok(!page.entries.is_empty())
    }

    async fn read(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Vec<u8>>> {
        let request = HttpRequest::get(self.with_query(self.resource_url(path), &[]));
        let response = send_cancellable(transport, request, cancel).await?;

        if response.is_not_found() {
            debug!(path = %path, "Blob not found");
            return Ok(None);
        }
        if !response.is_success() {
            return Err(response.into_error(&format!("Read of {} failed", path)));
        }

        Ok(Some(response.body))
    }

    async fn write(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        content: Vec<u8>,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let request = HttpRequest::new(Method::Put, self.with_query(self.resource_url(path), &[]))
            .header("x-ms-blob-type", "BlockBlob")
            .body(content);
        let response = send_cancellable(transport, request, cancel).await?;

        if !response.is_success() {
            return Err(response.into_error(&format!("Write of {} failed", path)));
        }
        Ok(())
    }

    async fn rename(
        &self,
        transport: &dyn Transport,
        from: &StoragePath,
        to: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let request = HttpRequest::new(
            Method::Put,
            self.with_query(self.resource_url(to), &[("mode", "legacy".to_string())]),
        )
        .header(
            "x-ms-rename-source",
            format!("/{}/{}", self.container, encode_path(from)),
        );
        let response = send_cancellable(transport, request, cancel).await?;

        if response.is_not_found() {
            return Err(StorageError::NotFound(from.to_string()));
        }
        if !response.is_success() {
            return Err(response.into_error(&format!("Rename of {} to {} failed", from, to)));
        }
        Ok(())
    }

    async fn remove(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        recurse: bool,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let params = if path.is_folder() {
            vec![("recursive", recurse.to_string())]
        } else {
            Vec::new()
        };
        let request = HttpRequest::new(
            Method::Delete,
            self.with_query(self.resource_url(path), &params),
        );
        let response = send_cancellable(transport, request, cancel).await?;

        if response.is_not_found() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if !response.is_success() {
            return Err(response.into_error(&format!("Delete of {} failed", path)));
        }
        Ok(())
    }
}
