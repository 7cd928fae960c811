//! Byte streams returned by `open_read` and `open_write`

use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Backend, StorageBackend, StorageResult};
use crate::path::StoragePath;
use crate::transport::Transport;

/// Readable content of a file
#[derive(Debug)]
pub struct ReadStream {
    inner: Cursor<Vec<u8>>,
}

impl ReadStream {
    pub(crate) fn new(content: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(content),
        }
    }

    /// Total content length in bytes
    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining unread bytes
    pub fn into_bytes(self) -> Vec<u8> {
        let position = self.inner.position() as usize;
        let mut content = self.inner.into_inner();
        content.drain(..position.min(content.len()));
        content
    }
}

impl AsyncRead for ReadStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Buffered writer for a single file
///
/// Bytes written are held in memory and uploaded by [`WriteStream::commit`].
/// Dropping the writer without committing discards the content.
pub struct WriteStream {
    backend: Backend,
    transport: Arc<dyn Transport>,
    path: StoragePath,
    cancel: CancellationToken,
    buffer: Vec<u8>,
}

impl WriteStream {
    pub(crate) fn new(
        backend: Backend,
        transport: Arc<dyn Transport>,
        path: StoragePath,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            transport,
            path,
            cancel,
            buffer: Vec::new(),
        }
    }

    pub fn path(&self) -> &StoragePath {
        &self.path
    }

    /// Bytes buffered so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Upload the buffered content
    pub async fn commit(self) -> StorageResult<()> {
        debug!(path = %self.path, bytes = self.buffer.len(), "Committing write stream");
        self.backend
            .write(self.transport.as_ref(), &self.path, self.buffer, &self.cancel)
            .await
    }
}

impl std::fmt::Debug for WriteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteStream")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

impl AsyncWrite for WriteStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.get_mut().buffer.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
