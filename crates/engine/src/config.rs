//! Cluster configuration via `kvtx.toml`
//!
//! A cluster is described by two numbers: how many nodes it has and how
//! much memory each node may hold. Both must be positive.

use serde::{Deserialize, Serialize};
use std::path::Path;

use kvtx_core::{KvError, KvResult};

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "kvtx.toml";

fn default_node_count() -> usize {
    3
}

fn default_node_capacity() -> u64 {
    1024
}

/// Cluster configuration loaded from `kvtx.toml`.
///
/// # Example
///
/// ```toml
/// node_count = 3
/// node_capacity = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of nodes, ids `0..node_count`.
    #[serde(default = "default_node_count")]
    pub node_count: usize,
    /// Memory capacity of every node, in bytes of key plus value.
    #[serde(default = "default_node_capacity")]
    pub node_capacity: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_count: default_node_count(),
            node_capacity: default_node_capacity(),
        }
    }
}

impl ClusterConfig {
    /// Config with explicit values.
    pub fn new(node_count: usize, node_capacity: u64) -> Self {
        Self {
            node_count,
            node_capacity,
        }
    }

    /// Check that both values are positive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the offending field.
    pub fn validate(&self) -> KvResult<()> {
        if self.node_count == 0 {
            return Err(KvError::invalid_config("node_count must be at least 1"));
        }
        if self.node_capacity == 0 {
            return Err(KvError::invalid_config("node_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# kvtx cluster configuration
#
# Number of nodes in the cluster (node ids are 0..node_count)
node_count = 3

# Memory capacity of each node, counted as len(key) + len(value)
# over committed entries
node_capacity = 1024
"#
    }

    /// Parse and validate config from TOML text.
    ///
    /// Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> KvResult<Self> {
        let config: ClusterConfig = toml::from_str(content)
            .map_err(|e| KvError::invalid_config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> KvResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KvError::invalid_config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            KvError::InvalidConfig(msg) => {
                KvError::invalid_config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> KvResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| KvError::invalid_config(format!("failed to serialize config: {}", e)))
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> KvResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                KvError::invalid_config(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> KvResult<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| {
            KvError::invalid_config(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
