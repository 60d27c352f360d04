//! Connector configuration, loadable from YAML.

use crate::error::{Error, Result};
use diagnostics::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_use_cache() -> bool {
    true
}

/// Settings of one [`crate::BlobStoreConnector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    /// Cache existence and size lookups. Caching is only safe while this
    /// connector is the only writer of the store.
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            use_cache: default_use_cache(),
        }
    }
}

impl ConnectorConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let path_str = path.as_ref().display().to_string();
        debug!("Loading connector configuration from {path}", path: path_str);
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Configuration of a connector over a local directory store, one
/// sub-directory per container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectStoreConfig {
    /// Host directory holding the containers.
    pub root: PathBuf,

    #[serde(default)]
    pub connector: ConnectorConfig,

    /// Longest blob key the store accepts, if limited.
    #[serde(default)]
    pub max_key_length: Option<usize>,
}

impl ObjectStoreConfig {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            connector: ConnectorConfig::default(),
            max_key_length: None,
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let path_str = path.as_ref().display().to_string();
        debug!("Loading object store configuration from {path}", path: path_str);
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::invalid_argument("root", "root directory cannot be empty"));
        }
        if self.max_key_length == Some(0) {
            return Err(Error::invalid_argument(
                "max_key_length",
                "max_key_length must be greater than 0",
            ));
        }
        self.connector.validate()
    }
}
