//! Configuration management for ulimi.
//!
//! This module handles loading configuration from `~/.ulimi/`.

mod paths;
mod settings;

pub use paths::{Paths, HOME_ENV};
pub use settings::{ColorSetting, Config, GeneralConfig, StorageConfig, SyncConfig};
