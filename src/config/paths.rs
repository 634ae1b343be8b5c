//! Path resolution for ulimi configuration and data files.
//!
//! All ulimi data is stored in `~/.ulimi/` (or `$ULIMI_HOME`):
//! - `config.yaml` - Main configuration file
//! - `ulimi.db` - SQLite key-value store (records and sync queue)

use std::path::PathBuf;

use crate::error::UlimiError;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "ULIMI_HOME";

/// Paths to ulimi configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.ulimi/`
    pub root: PathBuf,
    /// Config file: `~/.ulimi/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.ulimi/ulimi.db`
    pub database: PathBuf,
}

impl Paths {
    /// Resolve paths from `$ULIMI_HOME`, falling back to `$HOME/.ulimi`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn new() -> Result<Self, UlimiError> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = std::env::var("HOME").map_err(|_| {
            UlimiError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".ulimi")))
    }

    /// Create paths with a custom root directory (useful for testing).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("ulimi.db"),
            root,
        }
    }

    /// Ensure the data directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), UlimiError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                UlimiError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_root(PathBuf::from(".ulimi")))
    }
}
