//! Local record store commands.

use super::App;
use crate::cli::args::OutputFormat;
use crate::error::UlimiError;
use crate::output::{format_keys_pretty, to_json};

/// Write sample data where none exists.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn seed(app: &App, format: OutputFormat) -> Result<String, UlimiError> {
    app.storage.seed_sample_data();
    let keys = app.storage.keys();

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "keys": keys })),
        OutputFormat::Pretty => Ok(format!("Sample data ready ({} keys stored)", keys.len())),
    }
}

/// Print the value stored under `key`.
///
/// # Errors
///
/// Returns `UlimiError::NotFound` if nothing is stored under `key`.
pub fn get_value(app: &App, key: &str, format: OutputFormat) -> Result<String, UlimiError> {
    let raw = app
        .storage
        .get_raw(key)
        .ok_or_else(|| UlimiError::NotFound(format!("key '{key}'")))?;

    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => to_json(&value),
        Err(_) if format == OutputFormat::Pretty => Ok(raw),
        Err(e) => Err(e.into()),
    }
}

/// List keys in the configured namespace.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn list_keys(app: &App, format: OutputFormat) -> Result<String, UlimiError> {
    let keys = app.storage.keys();

    match format {
        OutputFormat::Json => to_json(&keys),
        OutputFormat::Pretty => Ok(format_keys_pretty(app.storage.namespace(), &keys)),
    }
}

/// Print the effective configuration.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn show_config(app: &App, format: OutputFormat) -> Result<String, UlimiError> {
    match format {
        OutputFormat::Json => to_json(&app.config),
        OutputFormat::Pretty => app.config.to_yaml(),
    }
}
