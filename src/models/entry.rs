//! Canonical listing entry
//!
//! Every backend converts its native listing and metadata records into
//! [`Entry`] values, so callers see one shape regardless of provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::path::StoragePath;

/// Metadata for one file or folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Full path from the storage root
    pub path: StoragePath,
    /// Size in bytes (files only)
    pub size: Option<u64>,
    /// Last modification time
    pub last_modified: Option<DateTime<Utc>>,
    /// Content checksum as reported by the backend (files only)
    pub checksum: Option<String>,
    /// Entity tag
    pub etag: Option<String>,
    /// Provider-specific properties with no typed field
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Entry {
    /// Create an entry with no metadata
    pub fn new(path: StoragePath) -> Self {
        Self {
            path,
            size: None,
            last_modified: None,
            checksum: None,
            etag: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn is_folder(&self) -> bool {
        self.path.is_folder()
    }

    /// Set the size; ignored for folders
    pub fn with_size(mut self, size: u64) -> Self {
        if !self.is_folder() {
            self.size = Some(size);
        }
        self
    }

    /// Set the checksum; ignored for folders
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        if !self.is_folder() {
            self.checksum = Some(checksum.into());
        }
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Store a provider-specific property; empty values are dropped
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.properties.insert(key.into(), value);
        }
    }
}
