//! Configuration via `stockpile.toml`
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "stockpile.toml";

/// Errors loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("config file '{path}': {source}")]
    Io {
        /// Path of the file
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),

    /// The refresh scheduler thread could not be started
    #[error("failed to start refresh scheduler: {0}")]
    Scheduler(#[source] std::io::Error),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

fn default_refresh_interval_ms() -> u64 {
    16
}

fn default_transaction_timeout_ms() -> u64 {
    5000
}

/// Configuration loaded from `stockpile.toml`.
///
/// # Example
///
/// ```toml
/// # Frame interval of the refresh scheduler (60 Hz)
/// refresh_interval_ms = 16
///
/// # How long a transaction waits for the store before failing
/// transaction_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockpileConfig {
    /// Frame interval of the refresh scheduler, in milliseconds.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Bound on waiting to open a transaction, in milliseconds.
    #[serde(default = "default_transaction_timeout_ms")]
    pub transaction_timeout_ms: u64,
}

impl Default for StockpileConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            transaction_timeout_ms: default_transaction_timeout_ms(),
        }
    }
}

impl StockpileConfig {
    /// Refresh interval as a `Duration`
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Transaction timeout as a `Duration`
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if an interval is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.transaction_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "transaction_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Stockpile configuration
#
# Frame interval of the refresh scheduler in milliseconds (default: 16, ~60 Hz).
# Work queued within one interval runs together on the next frame.
refresh_interval_ms = 16

# How long a transaction waits for the store before failing with
# StoreUnavailable, in milliseconds (default: 5000).
transaction_timeout_ms = 5000
"#
    }

    /// Parse config from TOML text and validate it.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: StockpileConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse(msg) => {
                ConfigError::Parse(format!("'{}': {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> ConfigResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = StockpileConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_millis(16));
        assert_eq!(config.transaction_timeout(), Duration::from_millis(5000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_toml_parses_to_default() {
        let config = StockpileConfig::from_toml(StockpileConfig::default_toml()).unwrap();
        assert_eq!(config, StockpileConfig::default());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = StockpileConfig::from_toml("").unwrap();
        assert_eq!(config, StockpileConfig::default());
    }

    #[test]
    fn zero_interval_is_invalid() {
        let err = StockpileConfig::from_toml("refresh_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = StockpileConfig::from_toml("transaction_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = StockpileConfig::from_toml("refresh_interval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        StockpileConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        assert_eq!(
            StockpileConfig::from_file(&path).unwrap(),
            StockpileConfig::default()
        );
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "refresh_interval_ms = 33\n").unwrap();

        StockpileConfig::write_default_if_missing(&path).unwrap();

        let config = StockpileConfig::from_file(&path).unwrap();
        assert_eq!(config.refresh_interval_ms, 33);
        assert_eq!(config.transaction_timeout_ms, 5000);
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = StockpileConfig {
            refresh_interval_ms: 8,
            transaction_timeout_ms: 250,
        };

        config.write_to_file(&path).unwrap();
        assert_eq!(StockpileConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = StockpileConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
