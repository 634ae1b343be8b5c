//! Operation types for the sync queue.
//!
//! A [`SyncOperation`] is one locally-applied mutation (create, update or
//! delete of a farm, task, order, ...) waiting to be reconciled with the
//! remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub const ALL: [Self; 3] = [Self::Create, Self::Update, Self::Delete];

    /// Get the display name for this operation type.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }

    /// Parse a user-supplied name.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" | "add" => Some(Self::Create),
            "update" | "edit" => Some(Self::Update),
            "delete" | "remove" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Domain entity kinds a mutation can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Farm,
    Task,
    Order,
    Inventory,
    MarketplaceItem,
    UserProfile,
}

impl EntityKind {
    pub const ALL: [Self; 6] = [
        Self::Farm,
        Self::Task,
        Self::Order,
        Self::Inventory,
        Self::MarketplaceItem,
        Self::UserProfile,
    ];

    /// Wire name, as used in persisted queues.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Farm => "farm",
            Self::Task => "task",
            Self::Order => "order",
            Self::Inventory => "inventory",
            Self::MarketplaceItem => "marketplace_item",
            Self::UserProfile => "user_profile",
        }
    }

    /// Plural collection name used for remote endpoints.
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        match self {
            Self::Farm => "farms",
            Self::Task => "tasks",
            Self::Order => "orders",
            Self::Inventory => "inventory",
            Self::MarketplaceItem => "marketplace",
            Self::UserProfile => "users",
        }
    }

    /// Parse a user-supplied name.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        let normalized = s.to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized || kind.collection() == normalized)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reconciliation state of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Waiting for the next pass.
    Pending,
    /// Dispatched and awaiting the outcome.
    #[serde(alias = "syncing")]
    InFlight,
    /// Retry ceiling reached; kept until cleared or retried.
    Failed,
}

impl OperationStatus {
    /// Whether the operation still counts as unsynced work.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::InFlight)
    }

    /// Parse a user-supplied name.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_flight" | "inflight" | "in-flight" | "syncing" => Some(Self::InFlight),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A mutation as submitted by a caller, before the queue stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOperation {
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub entity: EntityKind,
    pub entity_id: String,
    #[serde(default)]
    pub data: Value,
}

impl NewOperation {
    #[must_use]
    pub fn new(
        operation_type: OperationType,
        entity: EntityKind,
        entity_id: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            operation_type,
            entity,
            entity_id: entity_id.into(),
            data,
        }
    }

    #[must_use]
    pub fn create(entity: EntityKind, entity_id: impl Into<String>, data: Value) -> Self {
        Self::new(OperationType::Create, entity, entity_id, data)
    }

    #[must_use]
    pub fn update(entity: EntityKind, entity_id: impl Into<String>, data: Value) -> Self {
        Self::new(OperationType::Update, entity, entity_id, data)
    }

    #[must_use]
    pub fn delete(entity: EntityKind, entity_id: impl Into<String>) -> Self {
        Self::new(OperationType::Delete, entity, entity_id, Value::Null)
    }
}

/// A queued operation with its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    /// Unique ID, assigned at enqueue time
    pub id: String,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub entity: EntityKind,
    pub entity_id: String,
    #[serde(default)]
    pub data: Value,
    /// When the operation was queued
    pub timestamp: DateTime<Utc>,
    /// Failed reconciliation attempts so far
    #[serde(default)]
    pub retry_count: u32,
    pub status: OperationStatus,
    /// Last error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SyncOperation {
    /// Stamp a caller-supplied mutation with a fresh id and pending state.
    #[must_use]
    pub fn from_new(new: NewOperation) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation_type: new.operation_type,
            entity: new.entity,
            entity_id: new.entity_id,
            data: new.data,
            timestamp: Utc::now(),
            retry_count: 0,
            status: OperationStatus::Pending,
            last_error: None,
        }
    }

    /// Record a failed attempt, moving to `Failed` once `max_retries` is reached.
    ///
    /// Returns the new status.
    pub fn record_failure(&mut self, error: &str, max_retries: u32) -> OperationStatus {
        self.retry_count += 1;
        self.last_error = Some(error.to_string());
        self.status = if self.retry_count >= max_retries {
            OperationStatus::Failed
        } else {
            OperationStatus::Pending
        };
        self.status
    }

    /// Put a failed operation back in line with a clean retry budget.
    pub fn reset_for_retry(&mut self) {
        self.retry_count = 0;
        self.last_error = None;
        self.status = OperationStatus::Pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_type_names() {
        assert_eq!(OperationType::Create.display_name(), "Create");
        assert_eq!(OperationType::from_name("DELETE"), Some(OperationType::Delete));
        assert_eq!(OperationType::from_name("merge"), None);
    }

    #[test]
    fn test_entity_from_name() {
        assert_eq!(EntityKind::from_name("marketplace-item"), Some(EntityKind::MarketplaceItem));
        assert_eq!(EntityKind::from_name("farms"), Some(EntityKind::Farm));
        assert_eq!(EntityKind::from_name("user_profile"), Some(EntityKind::UserProfile));
        assert_eq!(EntityKind::from_name("weather"), None);
    }

    #[test]
    fn test_from_new_stamps_pending() {
        let op = SyncOperation::from_new(NewOperation::create(
            EntityKind::Task,
            "task1",
            json!({"title": "Test Task"}),
        ));

        assert_eq!(op.status, OperationStatus::Pending);
        assert_eq!(op.retry_count, 0);
        assert_eq!(op.entity_id, "task1");
        assert!(!op.id.is_empty());
    }

    #[test]
    fn test_record_failure_reaches_ceiling() {
        let mut op = SyncOperation::from_new(NewOperation::delete(EntityKind::Order, "order1"));

        assert_eq!(op.record_failure("timeout", 3), OperationStatus::Pending);
        assert_eq!(op.record_failure("timeout", 3), OperationStatus::Pending);
        assert_eq!(op.record_failure("refused", 3), OperationStatus::Failed);
        assert_eq!(op.retry_count, 3);
        assert_eq!(op.last_error.as_deref(), Some("refused"));

        op.reset_for_retry();
        assert_eq!(op.status, OperationStatus::Pending);
        assert_eq!(op.retry_count, 0);
        assert!(op.last_error.is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let op = SyncOperation::from_new(NewOperation::update(
            EntityKind::MarketplaceItem,
            "item1",
            json!({"price": 9.0}),
        ));
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(json["type"], "update");
        assert_eq!(json["entity"], "marketplace_item");
        assert_eq!(json["entityId"], "item1");
        assert_eq!(json["retryCount"], 0);
        assert_eq!(json["status"], "pending");
        assert!(json.get("lastError").is_none());
    }

    #[test]
    fn test_reads_dashboard_queue_entry() {
        let raw = r#"{
            "id": "1718000000000abc",
            "type": "create",
            "entity": "farm",
            "entityId": "farm1",
            "data": {"name": "Green Valley Farm"},
            "timestamp": "2025-01-10T08:30:00.000Z",
            "retryCount": 1,
            "status": "syncing"
        }"#;

        let op: SyncOperation = serde_json::from_str(raw).unwrap();
        assert_eq!(op.status, OperationStatus::InFlight);
        assert_eq!(op.retry_count, 1);
        assert_eq!(op.data["name"], "Green Valley Farm");
    }
}
