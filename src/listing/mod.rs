//! Listing engine
//!
//! A [`Listing`] is a lazy, one-shot sequence of [`Entry`] values. It fetches
//! one page at a time, yields every entry of that page, and only then asks the
//! backend for the next page. Pages are described by [`PageCursor`]s: a blob
//! container continues with a marker, a workspace filesystem descends into
//! the sub-directories it found when recursing.
//!
//! Cancellation is checked before every entry; once observed, the listing
//! yields a single [`StorageError::Cancelled`] and then ends.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::Entry;
use crate::path::StoragePath;
use crate::storage::{Backend, StorageBackend, StorageError, StorageResult};
use crate::transport::{Transport, send_cancellable};

pub mod json;
pub mod xml;

pub use json::parse_workspace_listing;
pub use xml::{BlobListing, parse_blob_listing};

/// Position of the next page to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// Folder being enumerated
    pub folder: StoragePath,
    /// Backend continuation marker
    pub marker: Option<String>,
}

impl PageCursor {
    /// First page of a folder
    pub fn start(folder: StoragePath) -> Self {
        Self {
            folder,
            marker: None,
        }
    }

    /// Continue `folder` from `marker`
    pub fn resume(folder: StoragePath, marker: impl Into<String>) -> Self {
        Self {
            folder,
            marker: Some(marker.into()),
        }
    }
}

/// One converted page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<Entry>,
    /// Further pages this page revealed
    pub next: Vec<PageCursor>,
}

/// Lazy sequence of entries under a folder
pub struct Listing {
    backend: Backend,
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
    recurse: bool,
    buffered: VecDeque<Entry>,
    pending: VecDeque<PageCursor>,
    pages_fetched: usize,
    finished: bool,
}

impl Listing {
    pub(crate) fn new(
        backend: Backend,
        transport: Arc<dyn Transport>,
        folder: StoragePath,
        recurse: bool,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            transport,
            cancel,
            recurse,
            buffered: VecDeque::new(),
            pending: VecDeque::from([PageCursor::start(folder)]),
            pages_fetched: 0,
            finished: false,
        }
    }

    /// Next entry, fetching another page when the current one is drained
    pub async fn next(&mut self) -> Option<StorageResult<Entry>> {
        loop {
            if self.finished {
                return None;
            }

            if self.cancel.is_cancelled() {
                self.finish();
                return Some(Err(StorageError::Cancelled));
            }

            if let Some(entry) = self.buffered.pop_front() {
                return Some(Ok(entry));
            }

            let Some(cursor) = self.pending.pop_front() else {
                self.finish();
                return None;
            };

            match self.fetch(&cursor).await {
                Ok(page) => {
                    self.buffered.extend(page.entries);
                    self.pending.extend(page.next);
                }
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            }
        }
    }

    /// Drain the listing into a vector, stopping at the first error
    pub async fn try_collect(mut self) -> StorageResult<Vec<Entry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next().await {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Number of page requests issued so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_recursive(&self) -> bool {
        self.recurse
    }

    fn finish(&mut self) {
        self.finished = true;
        self.buffered.clear();
        self.pending.clear();
    }

    async fn fetch(&mut self, cursor: &PageCursor) -> StorageResult<Page> {
        let request = self.backend.list_page_request(cursor, self.recurse);
        let response = send_cancellable(self.transport.as_ref(), request, &self.cancel).await?;
        self.pages_fetched += 1;

        if response.is_not_found() && self.backend.missing_listing_is_empty() {
            debug!(folder = %cursor.folder, "Listed folder does not exist");
            return Ok(Page::default());
        }

        if !response.is_success() {
            return Err(response.into_error(&format!("Listing {} failed", cursor.folder)));
        }

        let page = self
            .backend
            .parse_list_page(cursor, self.recurse, &response.body)?;

        debug!(
            backend = self.backend.kind(),
            folder = %cursor.folder,
            entries = page.entries.len(),
            continuations = page.next.len(),
            "Fetched listing page"
        );

        Ok(page)
    }
}

impl std::fmt::Debug for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listing")
            .field("backend", &self.backend.kind())
            .field("recurse", &self.recurse)
            .field("buffered", &self.buffered.len())
            .field("pending", &self.pending.len())
            .field("finished", &self.finished)
            .finish()
    }
}
