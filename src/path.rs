//! Storage path model
//!
//! Every public storage operation parses its raw path string into a
//! [`StoragePath`] before doing anything else. The parsed form is an ordered
//! list of non-empty segments plus a folder flag:
//!
//! - `"a//b"` and `"a/b"` parse to the same path (empty segments are dropped)
//! - a trailing separator marks a folder: `"a/b/"`
//! - a leading separator is ignored; paths are always relative to the storage root
//! - `.` and `..` are kept as literal segments so validators can reject them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Path separator used by every supported backend
pub const SEPARATOR: char = '/';

/// Canonical, immutable path inside a storage root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoragePath {
    segments: Vec<String>,
    is_folder: bool,
}

impl StoragePath {
    /// The storage root: no segments, always a folder
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            is_folder: true,
        }
    }

    /// Parse a raw path string
    ///
    /// # Example
    ///
    /// ```rust
    /// use remote_storage::StoragePath;
    ///
    /// let path = StoragePath::parse("/data//2024/");
    /// assert_eq!(path.segments(), ["data", "2024"]);
    /// assert!(path.is_folder());
    /// assert_eq!(path.to_string(), "data/2024/");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let segments: Vec<String> = raw
            .split(SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let is_folder = segments.is_empty() || raw.ends_with(SEPARATOR);

        Self {
            segments,
            is_folder,
        }
    }

    /// Parse an optional raw path; `None` is the root
    pub fn parse_opt(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_else(Self::root)
    }

    /// Build a path from segments
    ///
    /// Segments are split on the separator and empty pieces dropped, so the
    /// result upholds the same invariants as [`StoragePath::parse`].
    pub fn from_segments<I, S>(segments: I, is_folder: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .flat_map(|s| {
                s.as_ref()
                    .split(SEPARATOR)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        let is_folder = is_folder || segments.is_empty();

        Self {
            segments,
            is_folder,
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_folder(&self) -> bool {
        self.is_folder
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, or an empty string for the root
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Segments joined without leading or trailing separator
    pub fn relative(&self) -> String {
        self.segments.join("/")
    }

    /// Containing folder, `None` for the root
    pub fn parent(&self) -> Option<StoragePath> {
        if self.is_root() {
            return None;
        }
        Some(Self::from_segments(
            &self.segments[..self.segments.len() - 1],
            true,
        ))
    }

    /// Child path below this one
    pub fn child(&self, name: &str, is_folder: bool) -> StoragePath {
        Self::from_segments(self.segments.iter().map(String::as_str).chain([name]), is_folder)
    }

    /// Every prefix of this path, outermost first, ending with the path itself.
    ///
    /// All prefixes except the last are folders.
    pub fn prefixes(&self) -> impl Iterator<Item = StoragePath> + '_ {
        let len = self.segments.len();
        (1..=len).map(move |n| Self::from_segments(&self.segments[..n], n < len || self.is_folder))
    }
}

impl Default for StoragePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))?;
        if self.is_folder {
            write!(f, "{}", SEPARATOR)?;
        }
        Ok(())
    }
}

impl From<&str> for StoragePath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_root() {
        let path = StoragePath::parse("");
        assert!(path.is_root());
        assert!(path.is_folder());
        assert_eq!(path.name(), "");
        assert_eq!(StoragePath::parse_opt(None), StoragePath::root());
    }

    #[test]
    fn test_separators_collapse() {
        assert_eq!(StoragePath::parse("a//b"), StoragePath::parse("a/b"));
        assert_eq!(StoragePath::parse("/a/b"), StoragePath::parse("a/b"));
        assert_eq!(StoragePath::parse("a/b//"), StoragePath::parse("a/b/"));
    }

    #[test]
    fn test_folder_flag() {
        assert!(StoragePath::parse("folder/").is_folder());
        assert!(!StoragePath::parse("folder/file.txt").is_folder());
        assert!(StoragePath::parse("/").is_folder());
        assert!(StoragePath::parse("///").is_root());
    }

    #[test]
    fn test_dot_segments_are_literal() {
        let path = StoragePath::parse("a/../b/./c");
        assert_eq!(path.segments(), ["a", "..", "b", ".", "c"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(StoragePath::root().to_string(), "/");
        assert_eq!(StoragePath::parse("a/b").to_string(), "a/b");
        assert_eq!(StoragePath::parse("a/b/").to_string(), "a/b/");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["", "/", "a", "a/", "//a//b//", "x/./y", "/lead", "f.txt"] {
            let once = StoragePath::parse(raw);
            let twice = StoragePath::parse(&once.to_string());
            assert_eq!(once, twice, "raw input {raw:?}");
        }
    }

    #[test]
    fn test_parent_and_child() {
        let path = StoragePath::parse("a/b/c.txt");
        assert_eq!(path.parent(), Some(StoragePath::parse("a/b/")));
        assert_eq!(StoragePath::root().parent(), None);
        assert_eq!(
            StoragePath::parse("a/").child("b", false),
            StoragePath::parse("a/b")
        );
    }

    #[test]
    fn test_prefixes() {
        let prefixes: Vec<String> = StoragePath::parse("a/b/c")
            .prefixes()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(prefixes, ["a/", "a/b/", "a/b/c"]);
        assert_eq!(StoragePath::root().prefixes().count(), 0);
    }

    #[test]
    fn test_from_segments_splits_separators() {
        let path = StoragePath::from_segments(["a/b", "", "c"], false);
        assert_eq!(path.segments(), ["a", "b", "c"]);
        assert!(StoragePath::from_segments(Vec::<String>::new(), false).is_folder());
    }
}
