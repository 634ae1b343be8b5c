//! Well-known dashboard record collections.
//!
//! Records are schemaless JSON objects identified by an `"id"` field. The
//! sync manager applies each reconciled operation here so the local copy
//! reflects what the remote accepted.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use super::store::Storage;
use crate::features::sync::{EntityKind, OperationType, SyncOperation};

/// Storage keys used by the dashboard.
pub mod keys {
    pub const USER: &str = "user";
    pub const FARMS: &str = "farms";
    pub const TASKS: &str = "tasks";
    pub const ORDERS: &str = "orders";
    pub const MARKETPLACE: &str = "marketplace";
    pub const SUPPLIERS: &str = "suppliers";
    pub const WEATHER: &str = "weather";
    pub const AI_RECOMMENDATIONS: &str = "ai_recommendations";
    pub const USER_PREFERENCES: &str = "user_preferences";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const SYNC_QUEUE: &str = "sync_queue";
    pub const LAST_SYNC_TIMESTAMP: &str = "last_sync_timestamp";
}

/// Collection key holding local copies of `entity`, if it has one.
#[must_use]
pub const fn collection_key(entity: EntityKind) -> Option<&'static str> {
    match entity {
        EntityKind::Farm => Some(keys::FARMS),
        EntityKind::Task => Some(keys::TASKS),
        EntityKind::Order => Some(keys::ORDERS),
        EntityKind::MarketplaceItem => Some(keys::MARKETPLACE),
        EntityKind::Inventory | EntityKind::UserProfile => None,
    }
}

impl Storage {
    /// Records stored as a JSON array under `key`; empty when missing or corrupt.
    #[must_use]
    pub fn collection(&self, key: &str) -> Vec<Value> {
        self.get(key).unwrap_or_default()
    }

    pub fn save_collection(&self, key: &str, records: &[Value]) -> bool {
        self.set(key, records)
    }

    #[must_use]
    pub fn farms(&self) -> Vec<Value> {
        self.collection(keys::FARMS)
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<Value> {
        self.collection(keys::TASKS)
    }

    #[must_use]
    pub fn marketplace_items(&self) -> Vec<Value> {
        self.collection(keys::MARKETPLACE)
    }

    #[must_use]
    pub fn weather(&self) -> Option<Value> {
        self.get(keys::WEATHER)
    }

    /// User preferences; an empty object when none are saved.
    #[must_use]
    pub fn user_preferences(&self) -> Value {
        self.get(keys::USER_PREFERENCES)
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Reflect a reconciled operation in the matching local collection.
    ///
    /// Creates and updates mark the record `synced` with a `lastSyncAt`
    /// stamp (updates also merge the operation's fields in); deletes drop
    /// the record. Entities without a local collection, or records that are
    /// not present locally, are left alone. Returns whether anything changed.
    pub fn apply_synced(&self, operation: &SyncOperation) -> bool {
        let Some(key) = collection_key(operation.entity) else {
            return false;
        };

        let mut records = self.collection(key);
        let Some(index) = records
            .iter()
            .position(|r| r.get("id").and_then(Value::as_str) == Some(operation.entity_id.as_str()))
        else {
            return false;
        };

        match operation.operation_type {
            OperationType::Delete => {
                records.remove(index);
            },
            OperationType::Create | OperationType::Update => {
                let Some(record) = records[index].as_object_mut() else {
                    return false;
                };
                if operation.operation_type == OperationType::Update {
                    if let Some(fields) = operation.data.as_object() {
                        for (field, value) in fields {
                            record.insert(field.clone(), value.clone());
                        }
                    }
                }
                record.insert("synced".to_string(), Value::Bool(true));
                record.insert("lastSyncAt".to_string(), json!(Utc::now().to_rfc3339()));
            },
        }

        self.save_collection(key, &records)
    }

    /// Write demo farms, marketplace items, tasks and weather where none exist.
    pub fn seed_sample_data(&self) {
        let now = Utc::now();

        if self.farms().is_empty() {
            self.save_collection(
                keys::FARMS,
                &[json!({
                    "id": "farm1",
                    "farmerId": "farmer1",
                    "name": "Green Valley Farm",
                    "size": 5.5,
                    "location": {
                        "province": "Lusaka",
                        "district": "Lusaka",
                        "coordinates": [-15.3875, 28.3228]
                    },
                    "soilType": "Clay loam",
                    "crops": [{
                        "id": "crop1",
                        "farmId": "farm1",
                        "name": "Maize",
                        "variety": "SC627",
                        "plantingDate": "2024-12-01",
                        "expectedHarvestDate": "2025-04-15",
                        "area": 3.0,
                        "status": "growing",
                        "tasks": [],
                        "inventory": []
                    }],
                    "createdAt": now.to_rfc3339()
                })],
            );
        }

        if self.marketplace_items().is_empty() {
            self.save_collection(
                keys::MARKETPLACE,
                &[
                    marketplace_item("item1", "farmer1", "Mirriam", "Fresh Maize", "produce", "grain", 8.50, 500, "kg", ("Lusaka", "Lusaka")),
                    marketplace_item("item2", "supplier1", "AgriSupply Co.", "NPK Fertilizer", "inputs", "fertilizer", 350.00, 50, "bag", ("Copperbelt", "Kitwe")),
                    marketplace_item("item3", "farmer2", "Natasha", "Sweet Potatoes", "produce", "vegetable", 12.00, 200, "kg", ("Central", "Kabwe")),
                ],
            );
        }

        if self.tasks().is_empty() {
            self.save_collection(
                keys::TASKS,
                &[
                    json!({
                        "id": "task1",
                        "cropId": "crop1",
                        "title": "Apply fertilizer to maize field",
                        "type": "fertilizing",
                        "dueDate": (now + Duration::days(3)).to_rfc3339(),
                        "completed": false,
                        "priority": "high",
                        "createdAt": now.to_rfc3339()
                    }),
                    json!({
                        "id": "task2",
                        "cropId": "crop1",
                        "title": "Weed control",
                        "type": "other",
                        "dueDate": (now + Duration::days(7)).to_rfc3339(),
                        "completed": false,
                        "priority": "medium",
                        "createdAt": now.to_rfc3339()
                    }),
                ],
            );
        }

        if self.weather().is_none() {
            self.set(
                keys::WEATHER,
                &json!({
                    "date": now.to_rfc3339(),
                    "temperature": {"min": 18, "max": 28},
                    "humidity": 65,
                    "rainfall": 2.5,
                    "windSpeed": 12,
                    "conditions": "partly cloudy"
                }),
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn marketplace_item(
    id: &str,
    seller_id: &str,
    seller_name: &str,
    name: &str,
    category: &str,
    kind: &str,
    price: f64,
    quantity: u32,
    unit: &str,
    (province, district): (&str, &str),
) -> Value {
    json!({
        "id": id,
        "sellerId": seller_id,
        "sellerName": seller_name,
        "name": name,
        "category": category,
        "type": kind,
        "price": price,
        "currency": "ZMW",
        "quantity": quantity,
        "unit": unit,
        "location": {"province": province, "district": district},
        "images": [],
        "status": "available",
        "createdAt": Utc::now().to_rfc3339()
    })
}
