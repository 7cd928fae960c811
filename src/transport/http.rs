//! reqwest-backed transport
//!
//! Wraps a pooled `reqwest::Client`. An optional bearer token is attached to
//! every request; shared-access signatures travel in the URL built by the
//! backend.

use async_trait::async_trait;

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::storage::{StorageError, StorageResult};

/// HTTP transport over reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    bearer_token: Option<String>,
}

impl HttpTransport {
    /// Create a transport with a default client
    ///
    /// # Example
    ///
    /// ```rust
    /// use remote_storage::transport::http::HttpTransport;
    ///
    /// let transport = HttpTransport::new().with_bearer_token("dapi-token");
    /// ```
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a transport around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            bearer_token: None,
        }
    }

    /// Attach a bearer token to every request
    ///
    /// The token is never logged.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

// reqwest errors embed the full URL, signature included
fn network_error(target: &str, what: &str, error: reqwest::Error) -> StorageError {
    StorageError::NetworkError(format!("{} {}: {}", target, what, error.without_url()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> StorageResult<HttpResponse> {
        let target = format!("{} {}", request.method, request.redacted_url());
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);

        if let Some(ref token) = self.bearer_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if matches!(request.method, Method::Put | Method::Post) {
            builder = builder.body(request.body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| network_error(&target, "failed", e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| network_error(&target, "body read failed", e))?;

        if !(200..300).contains(&status) {
            tracing::warn!(status, target = %target, "Request returned non-success status");
        }

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_network_error_hides_query() {
        let transport = HttpTransport::new();
        let request = HttpRequest::get("http://127.0.0.1:1/data/a.txt?sv=2024&sig=TOPSECRET");

        let error = transport.send(request).await.unwrap_err();
        assert!(matches!(error, StorageError::NetworkError(_)));

        let message = error.to_string();
        assert!(message.contains("GET http://127.0.0.1:1/data/a.txt"));
        assert!(!message.contains("TOPSECRET"));
        assert!(!message.contains("sv=2024"));
    }
}
