//! Configuration settings for ulimi.
//!
//! Settings are loaded from `~/.ulimi/config.yaml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::error::UlimiError;
use crate::features::sync::{ExecutorConfig, DEFAULT_MAX_RETRIES};
use crate::storage::DEFAULT_NAMESPACE;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Local store settings.
    pub storage: StorageConfig,
    /// Sync queue settings.
    pub sync: SyncConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    /// Color output setting.
    #[serde(default = "default_color")]
    pub color: ColorSetting,
}

/// Color output setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    /// Auto-detect based on terminal.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

/// Local store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix applied to every stored key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Sync queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Failed attempts before an operation is marked failed.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Seconds between periodic passes in `ulimi watch`; 0 disables them.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Base URL of the remote REST API. Without it, operations are
    /// acknowledged locally.
    #[serde(default)]
    pub remote_endpoint: Option<String>,
    /// URL polled to decide whether the remote is reachable.
    #[serde(default)]
    pub health_url: Option<String>,
    /// Per-request timeout for dispatches and probes.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Treat the remote as unreachable until told otherwise.
    #[serde(default)]
    pub start_offline: bool,
    /// Spawn a pass right after each enqueue while online.
    #[serde(default)]
    pub sync_on_enqueue: bool,
}

const fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

const fn default_color() -> ColorSetting {
    ColorSetting::Auto
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

const fn default_interval_secs() -> u64 {
    30
}

const fn default_request_timeout() -> u64 {
    10
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: default_output_format(),
            color: default_color(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            interval_secs: default_interval_secs(),
            remote_endpoint: None,
            health_url: None,
            request_timeout_secs: default_request_timeout(),
            start_offline: false,
            sync_on_enqueue: false,
        }
    }
}

impl SyncConfig {
    /// Executor settings derived from this config. A zero ceiling is read as 1.
    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_retries: self.max_retries.max(1),
            sync_on_enqueue: self.sync_on_enqueue,
        }
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Periodic pass interval, if enabled.
    #[must_use]
    pub const fn interval(&self) -> Option<Duration> {
        if self.interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.interval_secs))
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, UlimiError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            UlimiError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            UlimiError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), UlimiError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| UlimiError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents).map_err(|e| {
            UlimiError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Render as YAML for display.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, UlimiError> {
        serde_yaml::to_string(self)
            .map_err(|e| UlimiError::Config(format!("Failed to serialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.general.default_output, OutputFormat::Pretty);
        assert_eq!(config.general.color, ColorSetting::Auto);
        assert_eq!(config.storage.namespace, "ulimi_");
        assert_eq!(config.sync.max_retries, 3);
        assert_eq!(config.sync.interval(), Some(Duration::from_secs(30)));
        assert!(config.sync.remote_endpoint.is_none());
        assert!(!config.sync.start_offline);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Pretty);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut config = Config::default();
        config.sync.max_retries = 5;
        config.sync.remote_endpoint = Some("https://api.ulimi.example".to_string());

        config.save_to_path(&config_path).unwrap();
        let loaded = Config::load_from_path(&config_path).unwrap();

        assert_eq!(loaded.sync.max_retries, 5);
        assert_eq!(
            loaded.sync.remote_endpoint.as_deref(),
            Some("https://api.ulimi.example")
        );
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let partial_yaml = r#"
sync:
  interval_secs: 0
  start_offline: true
"#;
        std::fs::write(&config_path, partial_yaml).unwrap();

        let config = Config::load_from_path(&config_path).unwrap();

        assert!(config.sync.interval().is_none());
        assert!(config.sync.start_offline);
        assert_eq!(config.sync.max_retries, 3);
        assert_eq!(config.storage.namespace, "ulimi_");
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "sync: [not, a, map]").unwrap();

        assert!(matches!(
            Config::load_from_path(&config_path),
            Err(UlimiError::Config(_))
        ));
    }

    #[test]
    fn test_zero_retries_clamped() {
        let mut config = SyncConfig::default();
        config.max_retries = 0;
        assert_eq!(config.executor_config().max_retries, 1);
    }

    #[test]
    fn test_sync_on_enqueue_reaches_executor() {
        let mut config = SyncConfig::default();
        assert!(!config.executor_config().sync_on_enqueue);

        config.sync_on_enqueue = true;
        assert!(config.executor_config().sync_on_enqueue);
    }
}
