#![cfg(feature = "config-file")]

use remote_storage::{StorageBackend, StorageConfig, StorageError};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_blob_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
kind = "blob"
account_url = "https://acct.blob.example.net"
container = "reports"
sas_token = "sv=2024&sig=abc"
"#
    )
    .unwrap();

    let config = StorageConfig::from_file(file.path()).unwrap();
    assert!(matches!(
        config,
        StorageConfig::Blob { ref container, sas_token: Some(_), .. } if container == "reports"
    ));
    assert_eq!(config.backend().unwrap().kind(), "blob");
}

#[test]
fn test_workspace_config_from_str() {
    let config = StorageConfig::from_toml_str(
        r#"
kind = "workspace"
host = "https://ws.example.net"
token = "dapi-secret"
"#,
    )
    .unwrap();
    assert_eq!(config.backend().unwrap().kind(), "workspace");
}

#[test]
fn test_unknown_kind_rejected() {
    let result = StorageConfig::from_toml_str(r#"kind = "ftp""#);
    assert!(matches!(result, Err(StorageError::ConfigError(_))));
}

#[test]
fn test_missing_file() {
    let result = StorageConfig::from_file("/nonexistent/storage.toml");
    assert!(matches!(result, Err(StorageError::ConfigError(_))));
}
