//! Configuration system for the skyplan scheduler.
//!
//! Load scheduler configuration from TOML or YAML files to control the
//! planning horizon, simulation gating and instance naming without code
//! changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use skyplan_config::SchedulerConfig;
//!
//! let config = SchedulerConfig::from_toml_str(r#"
//!     check_simulation = true
//!     instance_name_prefix = "act"
//!
//!     [horizon]
//!     start_seconds = 0
//!     end_seconds = 86400
//! "#).unwrap();
//!
//! assert!(config.check_simulation);
//! assert_eq!(config.horizon().unwrap().duration().in_seconds(), 86400);
//! ```
//!
//! Use the defaults when no file is present:
//!
//! ```
//! use skyplan_config::SchedulerConfig;
//!
//! let config = SchedulerConfig::load("scheduler.toml").unwrap_or_default();
//! assert!(!config.check_simulation);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skyplan_core::{Duration, ModelError, PlanningHorizon};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ModelError),
}

/// Horizon bounds in whole seconds from the plan epoch.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HorizonConfig {
    #[serde(default)]
    pub start_seconds: i64,
    pub end_seconds: i64,
}

/// Main scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Whether candidate activities are simulated (and their durations
    /// checked) before being committed to the plan.
    #[serde(default)]
    pub check_simulation: bool,

    /// Prefix for solver-generated instance names.
    #[serde(default = "default_name_prefix")]
    pub instance_name_prefix: String,

    /// Planning horizon bounds; optional, the problem's horizon is used
    /// when absent.
    #[serde(default)]
    pub horizon: Option<HorizonConfig>,
}

fn default_name_prefix() -> String {
    "act".to_owned()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            check_simulation: false,
            instance_name_prefix: default_name_prefix(),
            horizon: None,
        }
    }
}

impl SchedulerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or contains invalid
    /// TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// The configured planning horizon, if any.
    pub fn horizon(&self) -> Result<PlanningHorizon, ConfigError> {
        let bounds = self.horizon.unwrap_or_default();
        let horizon = PlanningHorizon::new(
            Duration::of_seconds(bounds.start_seconds),
            Duration::of_seconds(bounds.end_seconds),
        )?;
        Ok(horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_do_not_gate_on_simulation() {
        let config = SchedulerConfig::new();
        assert!(!config.check_simulation);
        assert_eq!(config.instance_name_prefix, "act");
        assert!(config.horizon.is_none());
    }

    #[test]
    fn toml_round_trip() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            check_simulation = true
            instance_name_prefix = "obs"

            [horizon]
            start_seconds = 100
            end_seconds = 200
            "#,
        )
        .unwrap();
        assert!(config.check_simulation);
        assert_eq!(config.instance_name_prefix, "obs");
        let horizon = config.horizon().unwrap();
        assert_eq!(horizon.start(), Duration::of_seconds(100));
        assert_eq!(horizon.end(), Duration::of_seconds(200));
    }

    #[test]
    fn yaml_parses_too() {
        let config = SchedulerConfig::from_yaml_str(
            "check_simulation: true\nhorizon:\n  start_seconds: 0\n  end_seconds: 60\n",
        )
        .unwrap();
        assert!(config.check_simulation);
        assert_eq!(config.horizon().unwrap().duration(), Duration::of_seconds(60));
    }

    #[test]
    fn inverted_horizon_is_rejected() {
        let config = SchedulerConfig::from_toml_str(
            "[horizon]\nstart_seconds = 100\nend_seconds = 50\n",
        )
        .unwrap();
        assert!(matches!(config.horizon().unwrap_err(), ConfigError::Invalid(_)));
    }
}
