//! JSON output formatting for ulimi.

use serde::Serialize;
use serde_json::json;

use crate::error::UlimiError;
use crate::features::sync::SyncOperation;

/// Format queued operations as JSON
///
/// # Errors
///
/// Returns `UlimiError::Parse` if JSON serialization fails.
pub fn format_queue_json(operations: &[SyncOperation]) -> Result<String, UlimiError> {
    let output = json!({
        "count": operations.len(),
        "items": operations
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Serialize any value as pretty JSON
///
/// # Errors
///
/// Returns `UlimiError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, UlimiError> {
    Ok(serde_json::to_string_pretty(value)?)
}
