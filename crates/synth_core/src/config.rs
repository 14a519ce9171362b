//! Engine configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use synth_ast::DEFAULT_MAX_RETAINED;
use synth_incremental::IncrementalConfig;

use crate::SynthError;

/// Node pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolConfig {
    /// Maximum number of free node records kept for reuse.
    pub max_retained: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_retained: DEFAULT_MAX_RETAINED,
        }
    }
}

/// Configuration for [`crate::Synth`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthConfig {
    /// Build a query index for every parse unless the call says otherwise.
    pub build_index: bool,
    pub incremental: IncrementalConfig,
    pub pool: PoolConfig,
}

impl SynthConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SynthError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SynthError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parses and validates configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SynthError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SynthError::config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SynthError> {
        self.incremental.validate().map_err(SynthError::config)
    }
}
