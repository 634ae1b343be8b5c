//! Pretty (human-readable) output formatting for ulimi.

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::features::sync::{OperationStatus, SyncOperation, SyncStatus};

/// Format the sync status block.
pub fn format_status_pretty(status: &SyncStatus) -> String {
    let mut lines = Vec::new();

    lines.push("Sync Status".bold().to_string());
    lines.push("─".repeat(40));

    let connectivity = if status.is_online {
        "online".green()
    } else {
        "offline".yellow()
    };
    lines.push(format!("  Connection: {connectivity}"));

    let last_sync = status
        .last_sync_timestamp
        .map_or_else(|| "never".dimmed().to_string(), format_age);
    lines.push(format!("  Last sync:  {last_sync}"));

    lines.push(format!(
        "  Pending:    {} {}",
        status.pending_operations,
        if status.pending_operations > 0 {
            "operations waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));

    lines.push(format!(
        "  Failed:     {} {}",
        status.failed_operations,
        if status.failed_operations > 0 {
            "operations need attention".red()
        } else {
            "".normal()
        }
    ));

    if let Some(oldest) = status.oldest_pending {
        lines.push(format!("  Oldest:     queued {}", format_age(oldest)));
    }

    if status.sync_in_progress {
        lines.push(format!("  {}", "Sync in progress".cyan()));
    }

    if status.pending_operations > 0 && status.is_online {
        lines.push(String::new());
        lines.push("Run 'ulimi sync' to reconcile now".dimmed().to_string());
    }

    lines.join("\n")
}

fn format_age(t: DateTime<Utc>) -> String {
    let age = Utc::now().signed_duration_since(t);
    if age.num_hours() > 0 {
        format!("{} hours ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{} minutes ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Format queued operations as a table.
pub fn format_queue_pretty(operations: &[SyncOperation], title: &str) -> String {
    if operations.is_empty() {
        return format!("{title} (0 operations)\n  Nothing queued");
    }

    let mut lines = Vec::new();
    lines.push(format!("{title} ({} operations)", operations.len()));
    lines.push("─".repeat(72));
    lines.push(format!(
        "{:<10} {:<8} {:<18} {:<14} {:<17} {}",
        "ID", "Type", "Entity", "Record", "Queued", "Status"
    ));
    lines.push("─".repeat(72));

    for op in operations {
        let short_id: String = op.id.chars().take(8).collect();
        let status = match op.status {
            OperationStatus::Pending => "pending".normal(),
            OperationStatus::InFlight => "in flight".cyan(),
            OperationStatus::Failed => "failed".red(),
        };
        let retries = if op.retry_count > 0 {
            format!(" ({} retries)", op.retry_count).dimmed().to_string()
        } else {
            String::new()
        };

        lines.push(format!(
            "{:<10} {:<8} {:<18} {:<14} {:<17} {status}{retries}",
            short_id,
            op.operation_type.display_name(),
            op.entity.as_str(),
            op.entity_id,
            op.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        ));

        if let Some(error) = &op.last_error {
            let short_error = if error.chars().count() > 60 {
                format!("{}...", error.chars().take(57).collect::<String>())
            } else {
                error.clone()
            };
            lines.push(format!("           {}", short_error.red()));
        }
    }

    lines.join("\n")
}

/// Format stored keys.
pub fn format_keys_pretty(namespace: &str, keys: &[String]) -> String {
    if keys.is_empty() {
        return format!("No keys stored under '{namespace}'");
    }

    let mut output = format!("Keys under '{namespace}' ({})\n", keys.len());
    output.push_str(&"─".repeat(40));
    for key in keys {
        output.push_str(&format!("\n  {key}"));
    }
    output
}
