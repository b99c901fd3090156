use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use advisory_core::loan::LoanDefaults;

/// Settings read from `--config`. Every field is optional in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Directory of `<id>.json` application records.
    pub store_dir: Option<PathBuf>,
    pub loan_defaults: LoanDefaults,
}

impl AdvisorConfig {
    /// Load from a YAML file, or fall back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
        let config: AdvisorConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config '{}': {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// The `--store-dir` flag wins over the file.
    pub fn resolve_store_dir(&self, flag: Option<&Path>) -> Result<PathBuf, Box<dyn std::error::Error>> {
        flag.map(Path::to_path_buf)
            .or_else(|| self.store_dir.clone())
            .ok_or_else(|| "--store-dir is required (or set store_dir in --config)".into())
    }
}
