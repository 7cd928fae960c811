//! Storage configuration
//!
//! A [`StorageConfig`] names one backend and its connection settings. It can
//! be read from environment variables or, with the `config-file` feature, from
//! a TOML document:
//!
//! ```toml
//! kind = "blob"
//! account_url = "https://acct.blob.core.windows.net"
//! container = "reports"
//! sas_token = "sv=2024-05-04&sig=..."
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::{Backend, BlobContainer, StorageError, StorageResult, Workspace};

/// Environment variable selecting the backend kind
pub const ENV_KIND: &str = "STORAGE_KIND";
pub const ENV_ACCOUNT_URL: &str = "STORAGE_ACCOUNT_URL";
pub const ENV_CONTAINER: &str = "STORAGE_CONTAINER";
pub const ENV_SAS_TOKEN: &str = "STORAGE_SAS_TOKEN";
pub const ENV_WORKSPACE_HOST: &str = "DATABRICKS_HOST";
pub const ENV_WORKSPACE_TOKEN: &str = "DATABRICKS_TOKEN";

/// Connection settings for one backend
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Hierarchical blob container
    Blob {
        account_url: String,
        container: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sas_token: Option<String>,
    },
    /// Workspace filesystem API
    Workspace { host: String, token: String },
}

impl StorageConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    StorageError::ConfigError(format!("{} environment variable not set", name))
                })
        };

        let kind = required(ENV_KIND)?;
        match kind.to_lowercase().as_str() {
            "blob" => Ok(StorageConfig::Blob {
                account_url: required(ENV_ACCOUNT_URL)?,
                container: required(ENV_CONTAINER)?,
                sas_token: lookup(ENV_SAS_TOKEN).filter(|value| !value.trim().is_empty()),
            }),
            "workspace" => Ok(StorageConfig::Workspace {
                host: required(ENV_WORKSPACE_HOST)?,
                token: required(ENV_WORKSPACE_TOKEN)?,
            }),
            other => Err(StorageError::ConfigError(format!(
                "Invalid storage kind: {}. Expected: blob, workspace",
                other
            ))),
        }
    }

    /// Parse a TOML document
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> StorageResult<Self> {
        toml::from_str(content)
            .map_err(|e| StorageError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Read and parse a TOML file
    #[cfg(feature = "config-file")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StorageError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Build the backend this configuration describes
    ///
    /// Blob container names are validated here.
    pub fn backend(&self) -> StorageResult<Backend> {
        match self {
            StorageConfig::Blob {
                account_url,
                container,
                sas_token,
            } => {
                let mut blob = BlobContainer::new(account_url.as_str(), container.as_str())?;
                if let Some(token) = sas_token {
                    blob = blob.with_sas_token(token.as_str());
                }
                Ok(Backend::Blob(blob))
            }
            StorageConfig::Workspace { host, .. } => {
                Ok(Backend::Workspace(Workspace::new(host.as_str())))
            }
        }
    }

    /// Build a facade over the HTTP transport
    #[cfg(feature = "http-transport")]
    pub fn connect(&self) -> StorageResult<crate::storage::Storage> {
        use crate::transport::http::HttpTransport;
        use std::sync::Arc;

        let backend = self.backend()?;
        let transport = match self {
            StorageConfig::Blob { .. } => HttpTransport::new(),
            StorageConfig::Workspace { token, .. } => {
                HttpTransport::new().with_bearer_token(token.as_str())
            }
        };
        Ok(crate::storage::Storage::new(backend, Arc::new(transport)))
    }
}

// Credentials stay out of logs
impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageConfig::Blob {
                account_url,
                container,
                sas_token,
            } => f
                .debug_struct("Blob")
                .field("account_url", account_url)
                .field("container", container)
                .field("sas_token", &sas_token.as_ref().map(|_| "<redacted>"))
                .finish(),
            StorageConfig::Workspace { host, .. } => f
                .debug_struct("Workspace")
                .field("host", host)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}
