//! Blob enumeration listing conversion
//!
//! Converts the XML `EnumerationResults` document returned by a blob container
//! listing into [`Entry`] values. The document has two kinds of nodes:
//!
//! - `BlobPrefix`: a sub-folder collapsed by the `delimiter` parameter, carrying only a `Name`
//! - `Blob`: a file or directory with a `Properties` bag; `ResourceType` tells them apart
//!
//! ```xml
//! <EnumerationResults ContainerName="data">
//!   <Blobs>
//!     <BlobPrefix><Name>logs/</Name></BlobPrefix>
//!     <Blob>
//!       <Name>readme.txt</Name>
//!       <Properties>
//!         <Last-Modified>Tue, 05 Mar 2024 10:00:00 GMT</Last-Modified>
//!         <Content-Length>42</Content-Length>
//!         <ResourceType>file</ResourceType>
//!       </Properties>
//!     </Blob>
//!   </Blobs>
//!   <NextMarker />
//! </EnumerationResults>
//! ```

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashSet;

use crate::models::Entry;
use crate::path::StoragePath;
use crate::storage::{StorageError, StorageResult};

const LAST_MODIFIED: &str = "Last-Modified";
const CONTENT_LENGTH: &str = "Content-Length";
const CONTENT_MD5: &str = "Content-MD5";
const ETAG: &str = "Etag";
const RESOURCE_TYPE: &str = "ResourceType";

/// One page of a blob listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobListing {
    /// Entries in document order
    pub entries: Vec<Entry>,
    /// Continuation marker for the next page, if any
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Prefix,
    Blob,
}

#[derive(Debug)]
struct RawNode {
    kind: NodeKind,
    name: String,
    properties: Vec<(String, String)>,
}

impl RawNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: String::new(),
            properties: Vec::new(),
        }
    }

    fn into_entry(self) -> StorageResult<Entry> {
        if self.name.is_empty() {
            return Err(StorageError::SerializationError(
                "Listing node has no name".to_string(),
            ));
        }

        if self.kind == NodeKind::Prefix {
            return Ok(Entry::new(StoragePath::from_segments([&self.name], true)));
        }

        let is_folder = self
            .properties
            .iter()
            .any(|(k, v)| k == RESOURCE_TYPE && v.eq_ignore_ascii_case("directory"));
        let mut entry = Entry::new(StoragePath::from_segments([&self.name], is_folder));

        for (key, value) in self.properties {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                LAST_MODIFIED => match parse_http_date(&value) {
                    Some(time) => entry = entry.with_last_modified(time),
                    None => entry.set_property(key, value),
                },
                CONTENT_LENGTH => match value.parse::<u64>() {
                    Ok(size) => entry = entry.with_size(size),
                    Err(_) => entry.set_property(key, value),
                },
                CONTENT_MD5 => entry = entry.with_checksum(value),
                ETAG => entry = entry.with_etag(value),
                RESOURCE_TYPE => {}
                _ => entry.set_property(key, value),
            }
        }

        Ok(entry)
    }
}

/// Parse an RFC 1123 date such as `Tue, 05 Mar 2024 10:00:00 GMT`
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// Parse one page of a blob enumeration listing.
///
/// When a hierarchical container reports a sub-folder both as a `BlobPrefix`
/// and as a directory `Blob`, only the prefix is kept.
pub fn parse_blob_listing(xml: &str) -> StorageResult<BlobListing> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut node: Option<RawNode> = None;
    let mut nodes: Vec<RawNode> = Vec::new();
    let mut next_marker = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "BlobPrefix" => node = Some(RawNode::new(NodeKind::Prefix)),
                    "Blob" => node = Some(RawNode::new(NodeKind::Blob)),
                    _ => {}
                }
                stack.push(name);
                text.clear();
            }
            Ok(Event::Text(ref e)) => {
                let value = e.unescape().map_err(|err| {
                    StorageError::SerializationError(format!("Invalid listing text: {}", err))
                })?;
                text.push_str(&value);
            }
            Ok(Event::CData(e)) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(_)) => {
                let Some(name) = stack.pop() else {
                    continue;
                };
                let value = std::mem::take(&mut text);
                let parent = stack.last().map(String::as_str);

                match (parent, name.as_str()) {
                    (Some("BlobPrefix" | "Blob"), "Name") => {
                        if let Some(current) = node.as_mut() {
                            current.name = value;
                        }
                    }
                    (Some("Properties"), _) => {
                        if let Some(current) = node.as_mut() {
                            current.properties.push((name.clone(), value));
                        }
                    }
                    (Some("EnumerationResults"), "NextMarker") => {
                        if !value.is_empty() {
                            next_marker = Some(value);
                        }
                    }
                    (_, "BlobPrefix" | "Blob") => {
                        if let Some(current) = node.take() {
                            nodes.push(current);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(StorageError::SerializationError(format!(
                    "Malformed listing XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    let mut entries = Vec::with_capacity(nodes.len());
    let mut kinds = Vec::with_capacity(nodes.len());
    for raw in nodes {
        kinds.push(raw.kind);
        entries.push(raw.into_entry()?);
    }

    let prefixes: HashSet<StoragePath> = entries
        .iter()
        .zip(&kinds)
        .filter(|(_, kind)| **kind == NodeKind::Prefix)
        .map(|(entry, _)| entry.path.clone())
        .collect();

    let entries = entries
        .into_iter()
        .zip(kinds)
        .filter(|(entry, kind)| *kind == NodeKind::Prefix || !prefixes.contains(&entry.path))
        .map(|(entry, _)| entry)
        .collect();

    Ok(BlobListing {
        entries,
        next_marker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acct.blob.example.net/" ContainerName="data">
  <Prefix>reports/</Prefix>
  <Delimiter>/</Delimiter>
  <Blobs>
    <Blob>
      <Name>reports/q1.csv</Name>
      <Properties>
        <Last-Modified>Tue, 05 Mar 2024 10:00:00 GMT</Last-Modified>
        <Etag>0x8DC3C</Etag>
        <Content-Length>1024</Content-Length>
        <Content-Type>text/csv</Content-Type>
        <Content-Encoding />
        <Content-MD5>sQqNsWTgdUEFt6mb5y4/5Q==</Content-MD5>
        <ResourceType>file</ResourceType>
      </Properties>
    </Blob>
    <BlobPrefix>
      <Name>reports/archive/</Name>
    </BlobPrefix>
  </Blobs>
  <NextMarker>2!72!MDAwMDA</NextMarker>
</EnumerationResults>"#;

    #[test]
    fn test_parse_file_and_prefix() {
        let listing = parse_blob_listing(PAGE).unwrap();
        assert_eq!(listing.entries.len(), 2);

        let file = &listing.entries[0];
        assert_eq!(file.path, StoragePath::parse("reports/q1.csv"));
        assert_eq!(file.size, Some(1024));
        assert_eq!(file.etag.as_deref(), Some("0x8DC3C"));
        assert_eq!(file.checksum.as_deref(), Some("sQqNsWTgdUEFt6mb5y4/5Q=="));
        assert_eq!(
            file.last_modified.map(|t| t.to_rfc3339()),
            Some("2024-03-05T10:00:00+00:00".to_string())
        );
        assert_eq!(file.properties.len(), 1);
        assert_eq!(file.properties["Content-Type"], "text/csv");

        let folder = &listing.entries[1];
        assert!(folder.is_folder());
        assert_eq!(folder.path.segments(), ["reports", "archive"]);
        assert_eq!(folder.size, None);
        assert!(folder.properties.is_empty());

        assert_eq!(listing.next_marker.as_deref(), Some("2!72!MDAwMDA"));
    }

    #[test]
    fn test_directory_blob_is_folder() {
        let xml = r#"<EnumerationResults><Blobs>
            <Blob><Name>a/b</Name><Properties>
              <Content-Length>0</Content-Length>
              <ResourceType>directory</ResourceType>
            </Properties></Blob>
        </Blobs><NextMarker /></EnumerationResults>"#;
        let listing = parse_blob_listing(xml).unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert!(listing.entries[0].is_folder());
        assert_eq!(listing.entries[0].size, None);
        assert_eq!(listing.next_marker, None);
    }

    #[test]
    fn test_directory_blob_shadowed_by_prefix() {
        let xml = r#"<EnumerationResults><Blobs>
            <Blob><Name>sub</Name><Properties><ResourceType>directory</ResourceType></Properties></Blob>
            <BlobPrefix><Name>sub/</Name></BlobPrefix>
        </Blobs></EnumerationResults>"#;
        let listing = parse_blob_listing(xml).unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].path, StoragePath::parse("sub/"));
    }

    #[test]
    fn test_escaped_names() {
        let xml = r#"<EnumerationResults><Blobs>
            <Blob><Name>a&amp;b.txt</Name><Properties /></Blob>
        </Blobs></EnumerationResults>"#;
        let listing = parse_blob_listing(xml).unwrap();
        assert_eq!(listing.entries[0].name(), "a&b.txt");
    }

    #[test]
    fn test_nameless_node_rejected() {
        let xml = "<EnumerationResults><Blobs><BlobPrefix></BlobPrefix></Blobs></EnumerationResults>";
        assert!(matches!(
            parse_blob_listing(xml),
            Err(StorageError::SerializationError(_))
        ));
    }

    #[test]
    fn test_malformed_xml_rejected() {
        let xml = "<EnumerationResults><Blobs><Blob><Name>x</Blobs>";
        assert!(parse_blob_listing(xml).is_err());
    }
}
