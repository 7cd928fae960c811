//! Workspace filesystem backend
//!
//! Implements StorageBackend for a workspace filesystem exposed through the
//! `/api/2.0/dbfs` REST API. Authentication is handled by the transport
//! (bearer token).
//!
//! The API lists a single directory per request, so recursive listings walk
//! the tree one directory page at a time. It has no single-request streaming
//! upload, so [`StorageBackend::supports_streaming_write`] is false; whole-file
//! writes go through the inline `put` endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{StorageBackend, StorageError, StorageResult};
use crate::listing::json::parse_file_info;
use crate::listing::{Page, PageCursor, parse_workspace_listing};
use crate::path::StoragePath;
use crate::transport::{HttpRequest, Method, Transport, send_cancellable};
use crate::validation::validate_workspace_path;

/// Bytes requested per read call
pub const READ_CHUNK_SIZE: usize = 1024 * 1024;

/// Largest payload accepted by the inline upload endpoint
pub const MAX_INLINE_UPLOAD: usize = 1024 * 1024;

/// Workspace filesystem storage backend
#[derive(Debug, Clone)]
pub struct Workspace {
    host: String,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    bytes_read: usize,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    path: &'a str,
    contents: String,
    overwrite: bool,
}

#[derive(Debug, Serialize)]
struct MoveRequest<'a> {
    source_path: &'a str,
    destination_path: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    path: &'a str,
    recursive: bool,
}

impl Workspace {
    /// Create a new workspace backend
    ///
    /// # Arguments
    ///
    /// * `host` - Workspace URL (e.g., "https://xxx.cloud.databricks.com")
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        info!(host = %host, "Created workspace backend");
        Self { host }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/2.0/dbfs/{}", self.host, endpoint)
    }

    fn api_url_with_path(&self, endpoint: &str, path: &StoragePath) -> String {
        format!(
            "{}?path={}",
            self.api_url(endpoint),
            urlencoding::encode(&absolute(path))
        )
    }

    async fn post_json<T: Serialize + Sync>(
        &self,
        transport: &dyn Transport,
        endpoint: &str,
        body: &T,
        subject: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let request = HttpRequest::new(Method::Post, self.api_url(endpoint)).json(body)?;
        let response = send_cancellable(transport, request, cancel).await?;

        if response.is_not_found() {
            return Err(StorageError::NotFound(subject.to_string()));
        }
        if !response.is_success() {
            return Err(response.into_error(&format!("{} of {} failed", endpoint, subject)));
        }
        Ok(())
    }
}

/// API paths are absolute, without trailing separator
fn absolute(path: &StoragePath) -> String {
    format!("/{}", path.relative())
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workspace:{}", self.host)
    }
}

#[async_trait]
impl StorageBackend for Workspace {
    fn kind(&self) -> &'static str {
        "workspace"
    }

    fn validate_path(&self, path: &StoragePath) -> StorageResult<()> {
        validate_workspace_path(path)?;
        Ok(())
    }

    fn list_page_request(&self, cursor: &PageCursor, _recurse: bool) -> HttpRequest {
        HttpRequest::get(self.api_url_with_path("list", &cursor.folder))
    }

    fn parse_list_page(
        &self,
        _cursor: &PageCursor,
        recurse: bool,
        body: &[u8],
    ) -> StorageResult<Page> {
        let entries = parse_workspace_listing(body)?;
        let next = if recurse {
            entries
                .iter()
                .filter(|entry| entry.is_folder())
                .map(|entry| PageCursor::start(entry.path.clone()))
                .collect()
        } else {
            Vec::new()
        };

        Ok(Page { entries, next })
    }

    fn supports_streaming_write(&self) -> bool {
        false
    }

    fn missing_listing_is_empty(&self) -> bool {
        true
    }

    async fn exists(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        let request = HttpRequest::get(self.api_url_with_path("get-status", path));
        let response = send_cancellable(transport, request, cancel).await?;

        if response.is_not_found() {
            return Ok(false);
        }
        if !response.is_success() {
            return Err(response.into_error(&format!("Status of {} failed", path)));
        }

        let info = parse_file_info(&response.body)?;
        Ok(info.is_dir == path.is_folder())
    }

    async fn read(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Vec<u8>>> {
        let mut content = Vec::new();

        loop {
            let url = format!(
                "{}&offset={}&length={}",
                self.api_url_with_path("read", path),
                content.len(),
                READ_CHUNK_SIZE
            );
            let response = send_cancellable(transport, HttpRequest::get(url), cancel).await?;

            if response.is_not_found() && content.is_empty() {
                debug!(path = %path, "Workspace file not found");
                return Ok(None);
            }
            if !response.is_success() {
                return Err(response.into_error(&format!("Read of {} failed", path)));
            }

            let chunk: ReadResponse = serde_json::from_slice(&response.body).map_err(|e| {
                StorageError::SerializationError(format!("Failed to parse read response: {}", e))
            })?;
            let bytes = STANDARD.decode(chunk.data.as_bytes()).map_err(|e| {
                StorageError::InvalidData(format!("Read of {} returned bad base64: {}", path, e))
            })?;
            content.extend_from_slice(&bytes);

            if chunk.bytes_read < READ_CHUNK_SIZE || bytes.is_empty() {
                break;
            }
        }

        Ok(Some(content))
    }

    async fn write(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        content: Vec<u8>,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        if content.len() > MAX_INLINE_UPLOAD {
            return Err(StorageError::NotSupported(format!(
                "{} cannot upload {} bytes in one request (max {})",
                self.kind(),
                content.len(),
                MAX_INLINE_UPLOAD
            )));
        }

        let absolute_path = absolute(path);
        let body = PutRequest {
            path: &absolute_path,
            contents: STANDARD.encode(&content),
            overwrite: true,
        };
        self.post_json(transport, "put", &body, path, cancel).await
    }

    async fn rename(
        &self,
        transport: &dyn Transport,
        from: &StoragePath,
        to: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let source = absolute(from);
        let destination = absolute(to);
        let body = MoveRequest {
            source_path: &source,
            destination_path: &destination,
        };
        self.post_json(transport, "move", &body, from, cancel).await
    }

    async fn remove(
        &self,
        transport: &dyn Transport,
        path: &StoragePath,
        recurse: bool,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let absolute_path = absolute(path);
        let body = DeleteRequest {
            path: &absolute_path,
            recursive: recurse,
        };
        self.post_json(transport, "delete", &body, path, cancel).await
    }
}
