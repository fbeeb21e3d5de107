//! Store configuration with environment variable and file-based loading.
//!
//! Environment variables:
//! - `SSNETWORK_STORE_ROOT`: Root directory for all tenants
//! - `SSNETWORK_STORE_TRANSFORM`: `identity` (default) or `cas`
//! - `SSNETWORK_STORE_READONLY`: Set to "true" for read-only mode
//!
//! Default root: `~/.ssnetwork`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::path_key::PathTransform;

/// Name of the fallback root when no home directory can be found.
pub const DEFAULT_ROOT_FOLDER_NAME: &str = "ssnetwork";

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory. Tenants live at `{root}/{tenant_id}/`.
    pub root: PathBuf,

    /// How keys are laid out beneath each tenant directory.
    #[serde(default)]
    pub transform: PathTransform,

    /// Read-only mode - rejects writes and deletes.
    #[serde(default)]
    pub read_only: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            transform: PathTransform::default(),
            read_only: false,
        }
    }
}

fn default_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(format!(".{}", DEFAULT_ROOT_FOLDER_NAME)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_FOLDER_NAME))
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let root = env::var("SSNETWORK_STORE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_root());

        let transform = match env::var("SSNETWORK_STORE_TRANSFORM") {
            Ok(v) => v.parse::<PathTransform>().context("invalid SSNETWORK_STORE_TRANSFORM")?,
            Err(_) => PathTransform::default(),
        };

        let read_only = env::var("SSNETWORK_STORE_READONLY")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            root,
            transform,
            read_only,
        })
    }

    /// Load configuration from a TOML file, falling back to environment.
    ///
    /// The file should contain a `[store]` section:
    /// ```toml
    /// [store]
    /// root = "/srv/ssnetwork"
    /// transform = "cas"
    /// read_only = false
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let table: toml::Table = contents
            .parse()
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;

        if let Some(section) = table.get("store") {
            let config: StoreConfig = section
                .clone()
                .try_into()
                .context("failed to parse [store] section")?;
            Ok(config)
        } else {
            Self::from_env()
        }
    }

    /// Create a writable identity-transform config rooted at `path`.
    pub fn with_root(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            transform: PathTransform::default(),
            read_only: false,
        }
    }

    /// Create a read-only config rooted at `path`.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            transform: PathTransform::default(),
            read_only: true,
        }
    }

    pub fn with_transform(mut self, transform: PathTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Reject configuration that cannot name a storage root.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.root.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig("root path is empty".into()));
        }
        Ok(())
    }

    /// Directory holding everything stored for `tenant`.
    pub fn tenant_dir(&self, tenant: &str) -> PathBuf {
        self.root.join(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert!(config
            .root
            .to_string_lossy()
            .contains(DEFAULT_ROOT_FOLDER_NAME));
        assert_eq!(config.transform, PathTransform::Identity);
        assert!(!config.read_only);
    }

    #[test]
    fn test_with_root_and_transform() {
        let config = StoreConfig::with_root("/srv/store").with_transform(PathTransform::ContentHash);
        assert_eq!(config.root, PathBuf::from("/srv/store"));
        assert_eq!(config.transform, PathTransform::ContentHash);
        assert!(!config.read_only);
        assert_eq!(config.tenant_dir("peer-1"), PathBuf::from("/srv/store/peer-1"));
    }

    #[test]
    fn test_read_only_config() {
        let config = StoreConfig::read_only("/srv/store");
        assert!(config.read_only);
    }

    #[test]
    fn test_validate_rejects_empty_root() {
        let config = StoreConfig::with_root("");
        assert!(matches!(
            config.validate(),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(StoreConfig::with_root("ssnetwork").validate().is_ok());
    }

    #[test]
    fn test_from_file_store_section() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[store]\nroot = \"/srv/ssnetwork\"\ntransform = \"cas\"\n",
        )?;

        let config = StoreConfig::from_file(&path)?;
        assert_eq!(config.root, PathBuf::from("/srv/ssnetwork"));
        assert_eq!(config.transform, PathTransform::ContentHash);
        assert!(!config.read_only);
        Ok(())
    }

    #[test]
    fn test_from_file_bad_transform() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nroot = \"/srv\"\ntransform = \"md5\"\n")?;

        let err = StoreConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("[store]"));
        Ok(())
    }

    #[test]
    fn test_from_file_missing() {
        let err = StoreConfig::from_file(Path::new("/nonexistent/store.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = StoreConfig::with_root("/custom/root").with_transform(PathTransform::ContentHash);
        let json = serde_json::to_string(&config).unwrap();
        let restored: StoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
