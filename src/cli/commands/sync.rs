//! Sync queue command implementation.

use std::time::Duration;

use colored::Colorize;
use serde_json::Value;

use super::App;
use crate::cli::args::OutputFormat;
use crate::error::UlimiError;
use crate::features::sync::{
    format_sync_report, EntityKind, HttpProbe, NewOperation, OperationStatus, OperationType,
};
use crate::output::{format_queue, format_status, to_json};

/// Health probe cadence when periodic passes are disabled.
const PROBE_FALLBACK_INTERVAL: Duration = Duration::from_secs(30);

/// Show sync status.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn status(app: &App, format: OutputFormat) -> Result<String, UlimiError> {
    format_status(&app.manager.sync_status(), format)
}

/// List queued operations, optionally filtered by status.
///
/// # Errors
///
/// Returns an error for an unknown status name or if output formatting fails.
pub fn list_operations(
    app: &App,
    status_filter: Option<&str>,
    format: OutputFormat,
) -> Result<String, UlimiError> {
    let status = status_filter
        .map(|s| {
            OperationStatus::from_name(s)
                .ok_or_else(|| UlimiError::Config(format!("Unknown status: {s}")))
        })
        .transpose()?;

    let operations: Vec<_> = app
        .manager
        .sync_queue_details()
        .into_iter()
        .filter(|op| status.map_or(true, |s| op.status == s))
        .collect();

    let title = status.map_or_else(
        || "Sync Queue".to_string(),
        |s| format!("{} Operations", s.to_string().to_uppercase()),
    );
    format_queue(&operations, &title, format)
}

/// Queue a mutation.
///
/// # Errors
///
/// Returns an error for an unknown operation type or entity, or a payload
/// that is not valid JSON.
pub fn add_operation(
    app: &App,
    operation: &str,
    entity: &str,
    entity_id: &str,
    data: Option<&str>,
    format: OutputFormat,
) -> Result<String, UlimiError> {
    let operation_type = OperationType::from_name(operation)
        .ok_or_else(|| UlimiError::Config(format!("Unknown operation type: {operation}")))?;
    let entity = EntityKind::from_name(entity)
        .ok_or_else(|| UlimiError::Config(format!("Unknown entity: {entity}")))?;
    let data: Value = match data {
        Some(raw) => serde_json::from_str(raw)?,
        None => Value::Null,
    };

    let id = app
        .manager
        .add_to_sync_queue(NewOperation::new(operation_type, entity, entity_id, data));

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "id": id })),
        OutputFormat::Pretty => Ok(format!(
            "Queued {} {} {} (ID: {})",
            operation_type.display_name(),
            entity,
            entity_id,
            id
        )),
    }
}

/// Reconcile now.
///
/// # Errors
///
/// Returns [`UlimiError::Offline`] when offline, or an error if output
/// formatting fails.
pub async fn force_sync(app: &App, format: OutputFormat) -> Result<String, UlimiError> {
    let report = app.manager.force_sync().await?;

    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Pretty => {
            if report.total() == 0 && !report.interrupted {
                Ok("No pending operations to sync.".to_string())
            } else {
                Ok(format_sync_report(&report))
            }
        },
    }
}

/// Reset failed operations for retry.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn retry_failed(app: &App, format: OutputFormat) -> Result<String, UlimiError> {
    let reset = app.manager.retry_failed_operations();

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "reset": reset })),
        OutputFormat::Pretty => Ok(format!("Reset {reset} failed operations for retry")),
    }
}

/// Drop failed operations.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn clear_failed(app: &App, format: OutputFormat) -> Result<String, UlimiError> {
    let cleared = app.manager.clear_failed_operations();

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "cleared": cleared })),
        OutputFormat::Pretty => Ok(format!("Cleared {cleared} failed operations")),
    }
}

/// Sync on reconnect and on a timer until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the health probe client cannot be built or the
/// interrupt handler cannot be installed.
pub async fn watch(app: &App, format: OutputFormat) -> Result<String, UlimiError> {
    let sync = &app.config.sync;
    let mut tasks = vec![app.manager.spawn_reconnect_listener()];

    if let Some(interval) = sync.interval() {
        tasks.push(app.manager.spawn_periodic_sync(interval));
    }

    // Connectivity only changes through the probe.
    if let Some(url) = &sync.health_url {
        let probe = HttpProbe::new(url.as_str(), sync.request_timeout(), app.signal.clone())?;
        tasks.push(probe.spawn(probe_interval(sync.interval())));
    }

    if let Some(report) = app.manager.sync_pending().await {
        tracing::info!(succeeded = report.succeeded, failed = report.failed, "initial sync");
    }

    if format == OutputFormat::Pretty {
        eprintln!("{}", "Watching for connectivity changes (Ctrl-C to stop)".dimmed());
    }

    tokio::signal::ctrl_c().await?;

    for task in tasks {
        task.abort();
    }

    status(app, format)
}

fn probe_interval(sync_interval: Option<Duration>) -> Duration {
    sync_interval.unwrap_or(PROBE_FALLBACK_INTERVAL)
}
