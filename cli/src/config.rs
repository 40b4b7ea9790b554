//! Batch check configuration.
//!
//! Loaded from YAML to control which files `chara-card check` scans and
//! which outcomes count as failures.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! extensions:
//!   - json
//! exclude:
//!   - package.json
//! policy:
//!   target: canonical
//!   fail_on_out_of_sync: true
//!   allow_legacy: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or saving a [`CheckConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Which format the checked cards are expected to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CheckTarget {
    /// Cards must be V2 (optionally with V1 fields backfilled).
    #[default]
    Canonical,
    /// Cards may be V1; V2 cards are reported as already migrated.
    Legacy,
}

/// Which outcomes fail a check run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckPolicy {
    /// Expected card format.
    pub target: CheckTarget,
    /// Fail backfilled V2 cards whose V1 fields disagree with `data`.
    pub fail_on_out_of_sync: bool,
    /// With the canonical target, accept V1 cards instead of failing them.
    pub allow_legacy: bool,
}

impl Default for CheckPolicy {
    fn default() -> Self {
        Self {
            target: CheckTarget::Canonical,
            fail_on_out_of_sync: true,
            allow_legacy: false,
        }
    }
}

/// Top-level configuration for `chara-card check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// File extensions picked up when scanning directories.
    pub extensions: Vec<String>,
    /// File names to skip.
    pub exclude: Vec<String>,
    /// Failure policy.
    pub policy: CheckPolicy,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            extensions: vec!["json".to_string()],
            exclude: Vec::new(),
            policy: CheckPolicy::default(),
        }
    }
}

impl CheckConfig {
    /// Loads configuration from a YAML file. Missing keys take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read, or
    /// [`ConfigError::YamlError`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be written, or
    /// [`ConfigError::YamlError`] if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if a file named `name` is in the exclusion list.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|excluded| excluded == name)
    }

    /// Returns `true` if `path` has one of the configured extensions.
    pub fn has_card_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_scan_json_and_fail_out_of_sync() {
        let config = CheckConfig::default();
        assert!(config.has_card_extension(Path::new("cards/sui.JSON")));
        assert!(!config.has_card_extension(Path::new("cards/sui.png")));
        assert!(config.policy.fail_on_out_of_sync);
        assert_eq!(config.policy.target, CheckTarget::Canonical);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: CheckConfig = serde_yaml::from_str("exclude: [package.json]\n").unwrap();
        assert!(config.is_excluded("package.json"));
        assert_eq!(config.extensions, vec!["json".to_string()]);
        assert!(!config.policy.allow_legacy);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.yml");

        let mut config = CheckConfig::default();
        config.policy.target = CheckTarget::Legacy;
        config.policy.allow_legacy = true;
        config.save(&path).unwrap();

        let loaded = CheckConfig::load(&path).unwrap();
        assert_eq!(loaded.policy.target, CheckTarget::Legacy);
        assert!(loaded.policy.allow_legacy);
    }
}
