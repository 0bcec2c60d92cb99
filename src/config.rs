//! Mapping context configuration

use crate::error::{OgmError, OgmResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning and strictness knobs for a [`MappingContext`](crate::MappingContext)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Initial capacity of the node registers
    pub node_capacity: usize,
    /// Initial capacity of the relationship registers
    pub relationship_capacity: usize,
    /// Reject node registration when the primary-index value cannot be used
    /// as a key (float, list, map). When false such nodes are tracked by
    /// native id only. A null or missing value is never an error.
    pub strict_primary_index: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            node_capacity: 1024,
            relationship_capacity: 4096,
            strict_primary_index: false,
        }
    }
}

impl ContextConfig {
    pub fn validate(&self) -> OgmResult<()> {
        if self.node_capacity == 0 {
            return Err(OgmError::Config("node_capacity must be positive".to_string()));
        }
        if self.relationship_capacity == 0 {
            return Err(OgmError::Config(
                "relationship_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> OgmResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> OgmResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file: `.yml`/`.yaml` as YAML, anything else as JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> OgmResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml") | Some("yaml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }
}
