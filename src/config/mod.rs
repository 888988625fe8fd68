//! Configuration module
//!
//! Handles loading and layering harness configuration.
//! Precedence: CLI flags > environment > config file > defaults.

mod env;
mod file;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};
pub use file::{expand_path, CONFIG_LOCATIONS};

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::output::OutputFormat;
use crate::registry::DEFAULT_TIMEOUT_MS;
use crate::utils::LogLevel;

/// Harness configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Timeout for suites registered without an override
    pub default_timeout_ms: u64,

    /// Number of times to run the registry
    pub rounds: u32,

    /// Output format (table, json, json-pretty, csv, summary)
    pub format: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Colorize table output
    pub color: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            rounds: 1,
            format: "table".to_string(),
            log_level: "warn".to_string(),
            color: true,
        }
    }
}

impl HarnessConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.default_timeout_ms == 0 {
            return Err(HarnessError::InvalidConfig(
                "default_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.rounds == 0 {
            return Err(HarnessError::InvalidConfig(
                "rounds must be at least 1".to_string(),
            ));
        }
        self.output_format()?;
        self.log_level()?;
        Ok(())
    }

    pub fn output_format(&self) -> Result<OutputFormat, HarnessError> {
        self.format.parse()
    }

    pub fn log_level(&self) -> Result<LogLevel, HarnessError> {
        self.log_level.parse()
    }

    /// Apply environment overrides on top of this configuration
    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        if let Some(timeout) = env.timeout_ms {
            self.default_timeout_ms = timeout;
        }
        if let Some(rounds) = env.rounds {
            self.rounds = rounds;
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
        if env.no_color == Some(true) {
            self.color = false;
        }
        self
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self {
            default_timeout_ms: 5000,
            rounds: 3,
            format: "table".to_string(),
            log_level: "info".to_string(),
            color: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.default_timeout_ms, 2000);
        assert_eq!(config.rounds, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_timeout = HarnessConfig {
            default_timeout_ms: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let zero_rounds = HarnessConfig {
            rounds: 0,
            ..Default::default()
        };
        assert!(zero_rounds.validate().is_err());

        let bad_format = HarnessConfig {
            format: "xml".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            bad_format.validate(),
            Err(HarnessError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env = EnvConfig {
            timeout_ms: Some(750),
            format: Some("json".to_string()),
            no_color: Some(true),
            ..Default::default()
        };

        let config = HarnessConfig::default().with_env(&env);
        assert_eq!(config.default_timeout_ms, 750);
        assert_eq!(config.format, "json");
        assert!(!config.color);
        assert_eq!(config.rounds, 1);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: HarnessConfig = serde_yaml::from_str("rounds: 4\n").unwrap();
        assert_eq!(config.rounds, 4);
        assert_eq!(config.default_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.format, "table");
    }
}
