//! Validation functionality
//!
//! Provides the naming grammars each backend enforces:
//! - Container names (shares, buckets)
//! - Resource names (file and directory leaves)
//! - Workspace filesystem paths

pub mod naming;

pub use naming::{
    ValidationError, ValidationResult, is_valid_container_name, is_valid_resource_name,
    is_valid_workspace_path, validate_container_name, validate_resource_name,
    validate_workspace_path,
};
