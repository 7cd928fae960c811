//! Backend naming grammars.
//!
//! Every backend enforces its own rules for legal names. These functions check
//! those rules locally so that an illegal name is rejected before any request
//! is sent.
//!
//! Each grammar comes in two forms:
//! - `validate_*` returns a [`ValidationError`] describing the first violation
//! - `is_valid_*` is the boolean predicate over the same rules

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::path::{SEPARATOR, StoragePath};

/// Minimum length for container and share names
pub const MIN_CONTAINER_NAME_LENGTH: usize = 3;

/// Maximum length for container and share names
pub const MAX_CONTAINER_NAME_LENGTH: usize = 63;

/// Maximum length for a single file or directory name
pub const MAX_RESOURCE_NAME_LENGTH: usize = 255;

/// Characters no resource name may contain
pub const RESERVED_CHARACTERS: &[char] = &['"', '\\', '/', ':', '|', '<', '>', '*', '?'];

/// Characters that cannot appear unescaped in a relative URI reference
const URI_UNSAFE_CHARACTERS: &[char] = &[' ', '#', '[', ']', '{', '}', '^', '`'];

/// Exact device names, compared case-insensitively
const RESERVED_DEVICE_NAMES: &[&str] = &["PRN", "AUX", "NUL", "CON", "CLOCK$"];

/// Numbered device series; only a single digit 1-9 is reserved
static NUMBERED_DEVICE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(LPT|COM)[1-9]$").expect("valid device name pattern"));

static PERCENT_ESCAPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([0-9A-Fa-f]{2})?").expect("valid percent escape pattern"));

/// Reasons a name can fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is empty or whitespace only
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Name length is outside the allowed range
    #[error("{field} length must be between {min} and {max} (got {actual})")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    /// Name contains a character outside the allowed set
    #[error("{field} contains invalid character {character:?}")]
    InvalidCharacter { field: &'static str, character: char },

    /// Name has a structural problem (dashes, dots, separators)
    #[error("{field}: {reason}")]
    InvalidFormat { field: &'static str, reason: String },

    /// Name is reserved by the backend
    #[error("{field} cannot be the reserved name {name:?}")]
    Reserved { field: &'static str, name: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a container (share, bucket) name.
///
/// # Rules
///
/// - Must not be empty or whitespace
/// - Length between 3 and 63 characters
/// - Only letters, digits and dashes (letters in either case)
/// - Must not start or end with a dash
/// - Must not contain two consecutive dashes
///
/// # Examples
///
/// ```
/// use remote_storage::validation::naming::is_valid_container_name;
///
/// assert!(is_valid_container_name("my-share"));
/// assert!(is_valid_container_name("123"));
/// assert!(!is_valid_container_name("my--share"));
/// assert!(!is_valid_container_name("-share"));
/// ```
pub fn validate_container_name(name: &str) -> ValidationResult<()> {
    const FIELD: &str = "container name";

    if name.trim().is_empty() {
        return Err(ValidationError::Empty(FIELD));
    }

    let length = name.chars().count();
    if !(MIN_CONTAINER_NAME_LENGTH..=MAX_CONTAINER_NAME_LENGTH).contains(&length) {
        return Err(ValidationError::Length {
            field: FIELD,
            min: MIN_CONTAINER_NAME_LENGTH,
            max: MAX_CONTAINER_NAME_LENGTH,
            actual: length,
        });
    }

    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
    {
        return Err(ValidationError::InvalidCharacter {
            field: FIELD,
            character: c,
        });
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(ValidationError::InvalidFormat {
            field: FIELD,
            reason: "must not start or end with a dash".to_string(),
        });
    }

    if name.contains("--") {
        return Err(ValidationError::InvalidFormat {
            field: FIELD,
            reason: "must not contain consecutive dashes".to_string(),
        });
    }

    Ok(())
}

pub fn is_valid_container_name(name: &str) -> bool {
    validate_container_name(name).is_ok()
}

/// Validate the leaf name of a file or directory path.
///
/// # Rules
///
/// - The root has no leaf and is never a valid resource name
/// - The leaf must not be empty or whitespace
/// - At most 255 characters
/// - Must be a well-formed relative URI component
/// - Must not contain `" \ / : | < > * ?`, control characters or non-ASCII characters
/// - Must not be a device name (`PRN`, `AUX`, `NUL`, `CON`, `CLOCK$`, `LPT1`-`LPT9`,
///   `COM1`-`COM9`), in any case
/// - Must not be `.` or `..`, and must not end with a dot
///
/// # Examples
///
/// ```
/// use remote_storage::StoragePath;
/// use remote_storage::validation::naming::is_valid_resource_name;
///
/// assert!(is_valid_resource_name(&StoragePath::parse("folder/")));
/// assert!(is_valid_resource_name(&StoragePath::parse("docs/LPT0")));
/// assert!(!is_valid_resource_name(&StoragePath::parse("docs/LPT1")));
/// assert!(!is_valid_resource_name(&StoragePath::parse("docs/file.")));
/// ```
pub fn validate_resource_name(path: &StoragePath) -> ValidationResult<()> {
    const FIELD: &str = "resource name";

    if path.is_root() {
        return Err(ValidationError::Empty(FIELD));
    }

    let mut leaf = path.name().to_string();
    if path.is_folder() {
        leaf.push(SEPARATOR);
    }
    validate_leaf(&leaf, path.is_folder())
}

pub fn is_valid_resource_name(path: &StoragePath) -> bool {
    validate_resource_name(path).is_ok()
}

/// Validate a raw leaf as it appears in a path string, trailing separator included.
fn validate_leaf(raw: &str, is_folder: bool) -> ValidationResult<()> {
    const FIELD: &str = "resource name";

    let leaf = if is_folder {
        raw.strip_suffix(SEPARATOR).unwrap_or(raw)
    } else {
        raw
    };

    if leaf.trim().is_empty() {
        return Err(ValidationError::Empty(FIELD));
    }

    let length = leaf.chars().count();
    if length > MAX_RESOURCE_NAME_LENGTH {
        return Err(ValidationError::Length {
            field: FIELD,
            min: 1,
            max: MAX_RESOURCE_NAME_LENGTH,
            actual: length,
        });
    }

    if leaf.ends_with(SEPARATOR) {
        return Err(ValidationError::InvalidFormat {
            field: FIELD,
            reason: "must not end with a separator".to_string(),
        });
    }

    for c in leaf.chars() {
        if RESERVED_CHARACTERS.contains(&c) || c.is_control() || !c.is_ascii() {
            return Err(ValidationError::InvalidCharacter {
                field: FIELD,
                character: c,
            });
        }
    }

    if !is_well_formed_uri_component(leaf) {
        return Err(ValidationError::InvalidFormat {
            field: FIELD,
            reason: "is not a well-formed relative URI component".to_string(),
        });
    }

    if is_reserved_device_name(leaf) {
        return Err(ValidationError::Reserved {
            field: FIELD,
            name: leaf.to_string(),
        });
    }

    if leaf.ends_with('.') {
        return Err(ValidationError::InvalidFormat {
            field: FIELD,
            reason: "must not end with a dot".to_string(),
        });
    }

    Ok(())
}

/// Validate every segment of a workspace filesystem path.
///
/// # Rules
///
/// - Segments must not be `.` or `..`
/// - Segments must not contain control characters
/// - Segments must not exceed 255 bytes
pub fn validate_workspace_path(path: &StoragePath) -> ValidationResult<()> {
    const FIELD: &str = "workspace path segment";

    for segment in path.segments() {
        if segment.trim().is_empty() {
            return Err(ValidationError::Empty(FIELD));
        }

        if segment == "." || segment == ".." {
            return Err(ValidationError::Reserved {
                field: FIELD,
                name: segment.clone(),
            });
        }

        if segment.len() > MAX_RESOURCE_NAME_LENGTH {
            return Err(ValidationError::Length {
                field: FIELD,
                min: 1,
                max: MAX_RESOURCE_NAME_LENGTH,
                actual: segment.len(),
            });
        }

        if let Some(c) = segment.chars().find(|c| c.is_control()) {
            return Err(ValidationError::InvalidCharacter {
                field: FIELD,
                character: c,
            });
        }
    }

    Ok(())
}

pub fn is_valid_workspace_path(path: &StoragePath) -> bool {
    validate_workspace_path(path).is_ok()
}

fn is_reserved_device_name(leaf: &str) -> bool {
    RESERVED_DEVICE_NAMES
        .iter()
        .any(|name| leaf.eq_ignore_ascii_case(name))
        || NUMBERED_DEVICE_REGEX.is_match(leaf)
        || leaf == "."
        || leaf == ".."
}

/// Whether a leaf can stand alone as a relative URI reference without escaping.
///
/// A `%` must start a two-digit hex escape.
fn is_well_formed_uri_component(leaf: &str) -> bool {
    if leaf.contains(URI_UNSAFE_CHARACTERS) {
        return false;
    }

    PERCENT_ESCAPE_REGEX
        .captures_iter(leaf)
        .all(|caps| caps.get(1).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> bool {
        is_valid_resource_name(&StoragePath::parse(&format!("dir/{name}")))
    }

    #[test]
    fn test_container_name_boundaries() {
        assert!(is_valid_container_name(&"a".repeat(63)));
        assert!(!is_valid_container_name(&"a".repeat(64)));
        assert!(is_valid_container_name("abc"));
        assert!(!is_valid_container_name("ab"));
    }

    #[test]
    fn test_container_name_errors() {
        assert_eq!(
            validate_container_name("   "),
            Err(ValidationError::Empty("container name"))
        );
        assert!(matches!(
            validate_container_name("my_share"),
            Err(ValidationError::InvalidCharacter { character: '_', .. })
        ));
        assert!(matches!(
            validate_container_name("share-"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_resource_device_names() {
        for name in ["PRN", "aux", "Nul", "con", "CLOCK$", "lpt1", "COM9"] {
            assert!(!leaf(name), "{name} should be reserved");
        }
        for name in ["LPT0", "COM10", "CONE", "PRNT", "CLOCK"] {
            assert!(leaf(name), "{name} should be allowed");
        }
    }

    #[test]
    fn test_resource_trailing_dots() {
        assert!(!leaf("file."));
        assert!(!leaf("file.."));
        assert!(leaf("file"));
        assert!(leaf(".hidden"));
    }

    #[test]
    fn test_resource_uri_form() {
        assert!(leaf("report%20final"));
        assert!(!leaf("report%2"));
        assert!(!leaf("a#b"));
        assert!(!leaf("a b"));
    }

    #[test]
    fn test_resource_folder_trim() {
        assert!(validate_leaf("folder/", true).is_ok());
        assert!(validate_leaf("folder//", true).is_err());
        assert!(validate_leaf("/", true).is_err());
    }

    #[test]
    fn test_root_is_not_a_resource() {
        assert_eq!(
            validate_resource_name(&StoragePath::root()),
            Err(ValidationError::Empty("resource name"))
        );
    }

    #[test]
    fn test_workspace_path() {
        assert!(is_valid_workspace_path(&StoragePath::parse("a b/c d.csv")));
        assert!(is_valid_workspace_path(&StoragePath::root()));
        assert!(!is_valid_workspace_path(&StoragePath::parse("a/../b")));
        assert!(!is_valid_workspace_path(&StoragePath::parse("a/\u{7}")));
    }
}
