//! Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use remote_storage::{HttpRequest, HttpResponse, StorageError, StorageResult, Transport};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::runtime::Runtime;

pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Transport that replays scripted responses in order and records every request
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(status, body));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> StorageResult<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| StorageError::NetworkError("no scripted response left".to_string()))
    }
}

/// Transport whose requests never complete
pub struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn send(&self, _request: HttpRequest) -> StorageResult<HttpResponse> {
        std::future::pending().await
    }
}

/// Root listing of a tree holding `a.txt` and `sub/b.txt`, one level deep
pub const SHALLOW_LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="data">
  <Delimiter>/</Delimiter>
  <Blobs>
    <Blob>
      <Name>a.txt</Name>
      <Properties>
        <Content-Length>5</Content-Length>
        <ResourceType>file</ResourceType>
      </Properties>
    </Blob>
    <BlobPrefix><Name>sub/</Name></BlobPrefix>
  </Blobs>
  <NextMarker />
</EnumerationResults>"#;

/// Recursive listing of the same tree
pub const DEEP_LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="data">
  <Blobs>
    <Blob>
      <Name>a.txt</Name>
      <Properties><Content-Length>5</Content-Length><ResourceType>file</ResourceType></Properties>
    </Blob>
    <Blob>
      <Name>sub</Name>
      <Properties><ResourceType>directory</ResourceType></Properties>
    </Blob>
    <Blob>
      <Name>sub/b.txt</Name>
      <Properties><Content-Length>7</Content-Length><ResourceType>file</ResourceType></Properties>
    </Blob>
  </Blobs>
  <NextMarker />
</EnumerationResults>"#;
