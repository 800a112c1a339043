//! Configuration for the DDL core.
//!
//! Reads a TOML config file for the operator-facing CLI. The grammar
//! feature gates live in [`FeatureGates`] — a plain record passed into the
//! parser per call (spec §9, "Configuration"), never process-global state,
//! so that callers (and tests) can flip a gate for a single parse without
//! touching shared state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Feature gates recognized at parse time. Each gates one dialect
/// extension; disabling a gate turns the corresponding construct into an
/// `Unimplemented` error rather than a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureGates {
    pub enable_stored_generated_columns: bool,
    pub enable_column_default_values: bool,
    pub enable_check_constraint: bool,
}

impl Default for FeatureGates {
    fn default() -> Self {
        Self {
            enable_stored_generated_columns: true,
            enable_column_default_values: true,
            enable_check_constraint: true,
        }
    }
}

/// Top-level on-disk configuration for the `ddl-emulator` CLI.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub features: FeatureGates,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Emit the committed schema as JSON instead of a human summary.
    #[serde(default)]
    pub json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { json: false }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_feature_gates_enable_everything() {
        let gates = FeatureGates::default();
        assert!(gates.enable_stored_generated_columns);
        assert!(gates.enable_column_default_values);
        assert!(gates.enable_check_constraint);
    }

    #[test]
    fn partial_toml_keeps_other_gates_default() {
        let toml = "enable_check_constraint = false";
        let gates: FeatureGates = toml::from_str(toml).unwrap();
        assert!(!gates.enable_check_constraint);
        assert!(gates.enable_stored_generated_columns);
    }

    #[test]
    fn config_default_has_empty_output() {
        let config = Config::default();
        assert!(!config.output.json);
    }

    #[test]
    fn from_file_reads_a_toml_config_off_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ddl-emulator.toml");
        std::fs::write(
            &path,
            "[features]\nenable_check_constraint = false\n\n[output]\njson = true\n",
        )
        .expect("write config");

        let config = Config::from_file(&path).expect("load config");
        assert!(!config.features.enable_check_constraint);
        assert!(config.features.enable_stored_generated_columns);
        assert!(config.output.json);
    }

    #[test]
    fn from_file_reports_io_error_for_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
