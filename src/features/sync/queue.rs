//! Sync queue storage and management.
//!
//! The queue is an insertion-ordered list of [`SyncOperation`]s mirrored to
//! the `sync_queue` key after every change.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::operation::{NewOperation, OperationStatus, SyncOperation};
use crate::storage::records::keys;
use crate::storage::Storage;

/// Ordered queue of offline mutations.
#[derive(Debug)]
pub struct SyncQueue {
    storage: Storage,
    operations: Vec<SyncOperation>,
}

impl SyncQueue {
    /// Load the persisted queue, or start empty.
    ///
    /// Operations left in flight by an interrupted pass are put back to
    /// pending, and entries repeating an earlier id are dropped.
    #[must_use]
    pub fn load(storage: Storage) -> Self {
        let stored: Vec<SyncOperation> = storage.get(keys::SYNC_QUEUE).unwrap_or_default();

        let mut seen = HashSet::new();
        let mut operations = Vec::with_capacity(stored.len());
        for mut op in stored {
            if !seen.insert(op.id.clone()) {
                tracing::warn!(id = %op.id, "dropping duplicate queued operation");
                continue;
            }
            if op.status == OperationStatus::InFlight {
                op.status = OperationStatus::Pending;
            }
            operations.push(op);
        }

        tracing::debug!(count = operations.len(), "loaded sync queue");
        Self {
            storage,
            operations,
        }
    }

    /// Append a new pending operation and return its id.
    pub fn enqueue(&mut self, new: NewOperation) -> String {
        let mut operation = SyncOperation::from_new(new);
        while self.get(&operation.id).is_some() {
            operation.id = uuid::Uuid::new_v4().to_string();
        }

        let id = operation.id.clone();
        tracing::debug!(
            %id,
            operation = %operation.operation_type,
            entity = %operation.entity,
            entity_id = %operation.entity_id,
            "queued operation"
        );
        self.operations.push(operation);
        self.save();
        id
    }

    /// All operations in queue order.
    #[must_use]
    pub fn operations(&self) -> &[SyncOperation] {
        &self.operations
    }

    /// Get a specific operation by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SyncOperation> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// Ids of pending operations in queue order.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<String> {
        self.operations
            .iter()
            .filter(|op| op.status == OperationStatus::Pending)
            .map(|op| op.id.clone())
            .collect()
    }

    /// Move a pending operation to in-flight and return a copy for dispatch.
    ///
    /// Returns `None` if the operation is gone or no longer pending.
    pub fn begin(&mut self, id: &str) -> Option<SyncOperation> {
        let op = self
            .operations
            .iter_mut()
            .find(|op| op.id == id && op.status == OperationStatus::Pending)?;
        op.status = OperationStatus::InFlight;
        let dispatched = op.clone();
        self.save();
        Some(dispatched)
    }

    /// Return an in-flight operation to pending without counting an attempt.
    ///
    /// Returns whether the operation was in flight.
    pub fn release(&mut self, id: &str) -> bool {
        let Some(op) = self
            .operations
            .iter_mut()
            .find(|op| op.id == id && op.status == OperationStatus::InFlight)
        else {
            return false;
        };
        op.status = OperationStatus::Pending;
        self.save();
        true
    }

    /// Remove a reconciled operation.
    pub fn complete(&mut self, id: &str) -> Option<SyncOperation> {
        let index = self.operations.iter().position(|op| op.id == id)?;
        let op = self.operations.remove(index);
        self.save();
        Some(op)
    }

    /// Record a failed attempt; returns the resulting status.
    pub fn record_failure(
        &mut self,
        id: &str,
        error: &str,
        max_retries: u32,
    ) -> Option<OperationStatus> {
        let op = self.operations.iter_mut().find(|op| op.id == id)?;
        let status = op.record_failure(error, max_retries);
        if status == OperationStatus::Failed {
            tracing::error!(%id, attempts = op.retry_count, error, "operation failed after max retries");
        }
        self.save();
        Some(status)
    }

    /// Drop every failed operation; returns how many were removed.
    pub fn clear_failed(&mut self) -> usize {
        let before = self.operations.len();
        self.operations
            .retain(|op| op.status != OperationStatus::Failed);
        let removed = before - self.operations.len();
        if removed > 0 {
            self.save();
        }
        removed
    }

    /// Put every failed operation back to pending; returns how many were reset.
    pub fn retry_failed(&mut self) -> usize {
        let mut reset = 0;
        for op in &mut self.operations {
            if op.status == OperationStatus::Failed {
                op.reset_for_retry();
                reset += 1;
            }
        }
        if reset > 0 {
            self.save();
        }
        reset
    }

    /// Whether any operation is pending or in flight.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.operations.iter().any(|op| op.status.is_outstanding())
    }

    /// Get queue statistics.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let count = |status: OperationStatus| self.operations.iter().filter(|op| op.status == status).count();

        QueueStats {
            pending: count(OperationStatus::Pending),
            in_flight: count(OperationStatus::InFlight),
            failed: count(OperationStatus::Failed),
            oldest_pending: self
                .operations
                .iter()
                .filter(|op| op.status.is_outstanding())
                .map(|op| op.timestamp)
                .min(),
        }
    }

    fn save(&self) {
        self.storage.set(keys::SYNC_QUEUE, &self.operations);
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub pending: usize,
    pub in_flight: usize,
    pub failed: usize,
    /// Oldest outstanding operation timestamp
    pub oldest_pending: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sync::operation::{EntityKind, OperationType};
    use serde_json::json;

    fn create_test_queue() -> SyncQueue {
        SyncQueue::load(Storage::in_memory())
    }

    fn task(id: &str) -> NewOperation {
        NewOperation::create(EntityKind::Task, id, json!({"title": "Test Task"}))
    }

    #[test]
    fn test_enqueue_and_get() {
        let mut queue = create_test_queue();

        let id = queue.enqueue(task("task1"));

        let loaded = queue.get(&id).unwrap();
        assert_eq!(loaded.operation_type, OperationType::Create);
        assert_eq!(loaded.status, OperationStatus::Pending);
        assert!(queue.has_pending());
    }

    #[test]
    fn test_queue_order_is_insertion_order() {
        let mut queue = create_test_queue();

        let a = queue.enqueue(NewOperation::update(EntityKind::Farm, "farm1", json!({"name": "A"})));
        let b = queue.enqueue(NewOperation::update(EntityKind::Farm, "farm1", json!({"name": "B"})));
        let c = queue.enqueue(NewOperation::delete(EntityKind::Farm, "farm1"));

        assert_eq!(queue.pending_ids(), vec![a, b, c]);
    }

    #[test]
    fn test_persists_and_reloads() {
        let storage = Storage::in_memory();
        let id = {
            let mut queue = SyncQueue::load(storage.clone());
            queue.enqueue(task("task1"))
        };

        let queue = SyncQueue::load(storage);
        assert_eq!(queue.operations().len(), 1);
        assert_eq!(queue.operations()[0].id, id);
    }

    #[test]
    fn test_reload_resets_in_flight() {
        let storage = Storage::in_memory();
        {
            let mut queue = SyncQueue::load(storage.clone());
            let id = queue.enqueue(task("task1"));
            assert!(queue.begin(&id).is_some());
        }

        let queue = SyncQueue::load(storage);
        assert_eq!(queue.operations()[0].status, OperationStatus::Pending);
    }

    #[test]
    fn test_corrupt_queue_loads_empty() {
        let storage = Storage::in_memory();
        storage.set(keys::SYNC_QUEUE, &json!({"not": "a list"}));

        let queue = SyncQueue::load(storage);
        assert!(queue.operations().is_empty());
    }

    #[test]
    fn test_begin_only_takes_pending() {
        let mut queue = create_test_queue();
        let id = queue.enqueue(task("task1"));

        assert!(queue.begin(&id).is_some());
        assert_eq!(queue.get(&id).unwrap().status, OperationStatus::InFlight);
        assert!(queue.begin(&id).is_none());
        assert!(queue.begin("missing").is_none());
    }

    #[test]
    fn test_release_returns_in_flight_to_pending() {
        let mut queue = create_test_queue();
        let id = queue.enqueue(task("task1"));

        assert!(!queue.release(&id));
        queue.begin(&id);
        assert!(queue.release(&id));

        let op = queue.get(&id).unwrap();
        assert_eq!(op.status, OperationStatus::Pending);
        assert_eq!(op.retry_count, 0);
        assert_eq!(queue.pending_ids(), vec![id]);
    }

    #[test]
    fn test_record_failure_and_clear_failed() {
        let mut queue = create_test_queue();
        let doomed = queue.enqueue(task("task1"));
        let kept = queue.enqueue(task("task2"));

        assert_eq!(queue.record_failure(&doomed, "timeout", 1), Some(OperationStatus::Failed));
        assert_eq!(queue.stats().failed, 1);

        assert_eq!(queue.clear_failed(), 1);
        assert!(queue.get(&doomed).is_none());
        assert_eq!(queue.get(&kept).unwrap().status, OperationStatus::Pending);
    }

    #[test]
    fn test_retry_failed_resets_count() {
        let mut queue = create_test_queue();
        let id = queue.enqueue(task("task1"));
        queue.record_failure(&id, "timeout", 1);

        assert_eq!(queue.retry_failed(), 1);
        let op = queue.get(&id).unwrap();
        assert_eq!(op.status, OperationStatus::Pending);
        assert_eq!(op.retry_count, 0);
    }

    #[test]
    fn test_stats() {
        let mut queue = create_test_queue();
        let a = queue.enqueue(task("a"));
        let b = queue.enqueue(task("b"));
        queue.enqueue(task("c"));
        queue.begin(&a);
        queue.record_failure(&b, "boom", 1);

        let stats = queue.stats();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_flight, 1);
        assert_eq!(stats.failed, 1);
        assert!(stats.oldest_pending.is_some());
    }

    #[test]
    fn test_complete_removes() {
        let mut queue = create_test_queue();
        let id = queue.enqueue(task("task1"));

        assert!(queue.complete(&id).is_some());
        assert!(queue.get(&id).is_none());
        assert!(!queue.has_pending());
    }
}
