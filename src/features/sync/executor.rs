//! Sync executor for processing queued operations.
//!
//! Runs one reconciliation pass: pending operations are dispatched in queue
//! order, reconciled ones are removed and applied to local records, and
//! failures are counted against the retry ceiling.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use colored::Colorize;
use serde::Serialize;

use super::connectivity::Connectivity;
use super::operation::{EntityKind, OperationStatus, OperationType};
use super::queue::SyncQueue;
use super::reconciler::Reconciler;
use crate::storage::records::keys;
use crate::storage::Storage;

/// Default number of failed attempts before an operation is marked failed.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for the sync executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Failed attempts after which an operation stops being retried
    pub max_retries: u32,
    /// Start a background pass after each enqueue while online and idle
    pub sync_on_enqueue: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            sync_on_enqueue: false,
        }
    }
}

/// Result of dispatching a single operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub id: String,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub entity: EntityKind,
    pub success: bool,
    pub error: Option<String>,
    /// Status left in the queue, `None` once reconciled
    pub status: Option<OperationStatus>,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Operations reconciled and removed
    pub succeeded: usize,
    /// Attempts that failed (including those that hit the ceiling)
    pub failed: usize,
    /// Operations that hit the retry ceiling during this pass
    pub exhausted: usize,
    /// Pending operations left untouched because connectivity dropped
    pub deferred: usize,
    /// Whether the pass stopped early on connectivity loss
    pub interrupted: bool,
    pub results: Vec<ExecutionResult>,
}

impl SyncReport {
    /// Add a result.
    pub fn add(&mut self, result: ExecutionResult) {
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            if result.status == Some(OperationStatus::Failed) {
                self.exhausted += 1;
            }
        }
        self.results.push(result);
    }

    /// Check if every attempted operation succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Operations dispatched during the pass.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Puts a dispatched operation back to pending if the pass is dropped
/// before its outcome is recorded.
struct InFlightGuard<'a> {
    queue: &'a Mutex<SyncQueue>,
    id: Option<&'a str>,
}

impl InFlightGuard<'_> {
    fn settle(&mut self) {
        self.id = None;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            if queue.release(id) {
                tracing::warn!(%id, "sync pass cancelled mid-dispatch, operation returned to pending");
            }
        }
    }
}

/// One pass over a queue.
pub struct SyncExecutor<'a> {
    queue: &'a Mutex<SyncQueue>,
    storage: &'a Storage,
    connectivity: &'a dyn Connectivity,
    reconciler: &'a dyn Reconciler,
    config: &'a ExecutorConfig,
}

impl<'a> SyncExecutor<'a> {
    #[must_use]
    pub fn new(
        queue: &'a Mutex<SyncQueue>,
        storage: &'a Storage,
        connectivity: &'a dyn Connectivity,
        reconciler: &'a dyn Reconciler,
        config: &'a ExecutorConfig,
    ) -> Self {
        Self {
            queue,
            storage,
            connectivity,
            reconciler,
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'a, SyncQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch every pending operation in queue order.
    ///
    /// Stops before the next dispatch once connectivity is lost. The
    /// last-sync timestamp is written only for passes that ran to the end.
    pub async fn execute_pending(&self) -> SyncReport {
        let pending = self.lock().pending_ids();
        let mut report = SyncReport::default();

        for (index, id) in pending.iter().enumerate() {
            if !self.connectivity.is_online() {
                report.interrupted = true;
                report.deferred = pending.len() - index;
                tracing::warn!(deferred = report.deferred, "connectivity lost, stopping sync pass");
                break;
            }

            // Cleared or already handled since the pass started.
            let Some(operation) = self.lock().begin(id) else {
                continue;
            };

            let mut in_flight = InFlightGuard {
                queue: self.queue,
                id: Some(id.as_str()),
            };
            let outcome = self.reconciler.dispatch(&operation).await;
            in_flight.settle();

            let result = match outcome {
                Ok(()) => {
                    self.lock().complete(id);
                    self.storage.apply_synced(&operation);
                    tracing::debug!(%id, entity = %operation.entity, "operation reconciled");
                    ExecutionResult {
                        id: id.clone(),
                        operation_type: operation.operation_type,
                        entity: operation.entity,
                        success: true,
                        error: None,
                        status: None,
                    }
                },
                Err(e) => {
                    let error_msg = e.to_string();
                    tracing::warn!(%id, error = %error_msg, "sync failed for operation");
                    let status =
                        self.lock()
                            .record_failure(id, &error_msg, self.config.max_retries);
                    ExecutionResult {
                        id: id.clone(),
                        operation_type: operation.operation_type,
                        entity: operation.entity,
                        success: false,
                        error: Some(error_msg),
                        status,
                    }
                },
            };
            report.add(result);
        }

        if !report.interrupted {
            self.storage.set(keys::LAST_SYNC_TIMESTAMP, &Utc::now());
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            deferred = report.deferred,
            "sync pass finished"
        );
        report
    }
}

/// Format a sync report for display.
#[must_use]
pub fn format_sync_report(report: &SyncReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Sync completed: {} operations", report.total()));
    lines.push("─".repeat(40));

    if report.succeeded > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} succeeded", report.succeeded).green()
        ));
    }

    if report.failed > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} failed", report.failed).red()
        ));
    }

    if report.exhausted > 0 {
        lines.push(format!(
            "  {} {}",
            "!".red().bold(),
            format!("{} out of retries", report.exhausted).red()
        ));
    }

    if report.deferred > 0 {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{} deferred (went offline)", report.deferred).yellow()
        ));
    }

    let errors: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.error.is_some())
        .take(3)
        .collect();

    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        for err in errors {
            lines.push(format!(
                "  - {} {}: {}",
                err.operation_type,
                err.entity,
                err.error.as_deref().unwrap_or("Unknown error")
            ));
        }
    }

    lines.join("\n")
}
