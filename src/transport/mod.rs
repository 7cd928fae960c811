//! Transport collaborator
//!
//! Backends describe each call as an [`HttpRequest`] and hand it to a
//! [`Transport`]. The transport owns connection pooling, authentication and
//! any retry policy; it returns the raw status, headers and body without
//! interpreting them.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::storage::{StorageError, StorageResult};

#[cfg(feature = "http-transport")]
pub mod http;

/// HTTP verbs used by the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A fully constructed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a raw body
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Set a JSON body and content type
    pub fn json<T: Serialize>(self, value: &T) -> StorageResult<Self> {
        let body = serde_json::to_vec(value).map_err(|e| {
            StorageError::SerializationError(format!("Failed to encode request body: {}", e))
        })?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }

    /// URL without its query string, safe for logs
    pub fn redacted_url(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

/// A response as returned by the transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Convert a non-success response into a transport failure carrying the raw status and body
    pub fn into_error(self, context: &str) -> StorageError {
        let body = String::from_utf8_lossy(&self.body);
        StorageError::Transport {
            status: self.status,
            message: format!("{}: {}", context, body.trim()),
        }
    }
}

/// Request/response primitive shared by all backends
///
/// Implementations must allow concurrent in-flight requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response
    ///
    /// Only network faults are errors; any status code is a successful send.
    async fn send(&self, request: HttpRequest) -> StorageResult<HttpResponse>;
}

/// Send a request, abandoning it as soon as `cancel` fires
pub async fn send_cancellable(
    transport: &dyn Transport,
    request: HttpRequest,
    cancel: &CancellationToken,
) -> StorageResult<HttpResponse> {
    if cancel.is_cancelled() {
        return Err(StorageError::Cancelled);
    }

    tracing::debug!(method = %request.method, url = request.redacted_url(), "Sending request");

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StorageError::Cancelled),
        response = transport.send(request) => response,
    }
}
