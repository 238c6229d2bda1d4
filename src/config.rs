//! Store configuration
//!
//! Settings can be built in code or loaded from YAML/JSON documents. Missing
//! fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::rdf::BlankNode;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Quad store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Label prefix for blank nodes minted without a suggestion
    pub blank_node_prefix: String,
    /// Drop index branches that become empty after a removal
    pub prune_empty_levels: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            blank_node_prefix: "b".to_string(),
            prune_empty_levels: true,
        }
    }
}

impl StoreConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        // the counter is appended to the prefix, so the prefix alone must be a valid label
        BlankNode::new(&self.blank_node_prefix).map_err(|_| {
            ConfigError::Invalid(format!(
                "blank_node_prefix {:?} is not a valid blank node label",
                self.blank_node_prefix
            ))
        })?;
        Ok(())
    }
}
