//! Output formatting for ulimi.
//!
//! This module renders sync state and queue contents as pretty text or JSON.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::UlimiError;
use crate::features::sync::{SyncOperation, SyncStatus};

pub use json::*;
pub use pretty::*;

/// Format the sync status based on output format
///
/// # Errors
///
/// Returns `UlimiError::Parse` if JSON serialization fails.
pub fn format_status(status: &SyncStatus, format: OutputFormat) -> Result<String, UlimiError> {
    match format {
        OutputFormat::Pretty => Ok(format_status_pretty(status)),
        OutputFormat::Json => to_json(status),
    }
}

/// Format queued operations based on output format
///
/// # Errors
///
/// Returns `UlimiError::Parse` if JSON serialization fails.
pub fn format_queue(
    operations: &[SyncOperation],
    title: &str,
    format: OutputFormat,
) -> Result<String, UlimiError> {
    match format {
        OutputFormat::Pretty => Ok(format_queue_pretty(operations, title)),
        OutputFormat::Json => format_queue_json(operations),
    }
}
