//! Workspace filesystem listing conversion
//!
//! The workspace API lists one directory per request:
//!
//! ```json
//! {"files": [
//!   {"path": "/data/raw", "is_dir": true, "file_size": 0, "modification_time": 1709632800000},
//!   {"path": "/data/a.json", "is_dir": false, "file_size": 128, "modification_time": 1709632800000}
//! ]}
//! ```
//!
//! An empty directory may omit `files` entirely.

use chrono::DateTime;
use serde::Deserialize;

use crate::models::Entry;
use crate::path::StoragePath;
use crate::storage::{StorageError, StorageResult};

/// Directory listing response from the workspace API
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    files: Vec<FileInfo>,
}

/// File info from the workspace API
#[derive(Debug, Deserialize)]
pub(crate) struct FileInfo {
    pub path: String,
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub modification_time: Option<i64>,
}

impl FileInfo {
    pub(crate) fn into_entry(self) -> Entry {
        let mut entry = Entry::new(StoragePath::from_segments([&self.path], self.is_dir));

        if let Ok(size) = u64::try_from(self.file_size) {
            entry = entry.with_size(size);
        }

        if let Some(time) = self
            .modification_time
            .and_then(DateTime::from_timestamp_millis)
        {
            entry = entry.with_last_modified(time);
        }

        entry
    }
}

/// Parse one directory listing into entries, in response order
pub fn parse_workspace_listing(body: &[u8]) -> StorageResult<Vec<Entry>> {
    let response: ListResponse = serde_json::from_slice(body).map_err(|e| {
        StorageError::SerializationError(format!("Failed to parse workspace listing: {}", e))
    })?;

    Ok(response
        .files
        .into_iter()
        .map(FileInfo::into_entry)
        .collect())
}

/// Parse a single status record
pub(crate) fn parse_file_info(body: &[u8]) -> StorageResult<FileInfo> {
    serde_json::from_slice(body).map_err(|e| {
        StorageError::SerializationError(format!("Failed to parse workspace status: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing() {
        let body = br#"{"files":[
            {"path":"/data/raw","is_dir":true,"file_size":0,"modification_time":1709632800000},
            {"path":"/data/a.json","is_dir":false,"file_size":128,"modification_time":1709632800000}
        ]}"#;
        let entries = parse_workspace_listing(body).unwrap();
        assert_eq!(entries.len(), 2);

        assert!(entries[0].is_folder());
        assert_eq!(entries[0].path.to_string(), "data/raw/");
        assert_eq!(entries[0].size, None);

        assert_eq!(entries[1].path.to_string(), "data/a.json");
        assert_eq!(entries[1].size, Some(128));
        assert_eq!(
            entries[1].last_modified.map(|t| t.to_rfc3339()),
            Some("2024-03-05T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_empty_directory() {
        assert!(parse_workspace_listing(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_workspace_listing(b"not json"),
            Err(StorageError::SerializationError(_))
        ));
    }
}
