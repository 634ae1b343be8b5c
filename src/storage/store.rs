//! Namespaced, typed access to a [`KeyValueStore`].
//!
//! Values are stored as JSON. Persistence here is best-effort: a failed or
//! corrupt read yields `None` and a failed write is logged and dropped, so
//! callers on the UI path never see storage errors.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::kv::{KeyValueStore, MemoryStore};

/// Default key prefix, shared with the browser dashboard's local storage.
pub const DEFAULT_NAMESPACE: &str = "ulimi_";

/// Typed view over a key-value backend, scoped to one namespace.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Storage {
    /// Wrap a backend using the default namespace.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_namespace(backend, DEFAULT_NAMESPACE)
    }

    /// Wrap a backend using a custom key prefix.
    #[must_use]
    pub fn with_namespace(backend: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// A fresh storage over an empty [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The key prefix applied to every key.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Read and deserialize the value under `key`.
    ///
    /// Missing keys, backend failures and undecodable values all return `None`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undecodable stored value");
                None
            }
        }
    }

    /// Read the raw JSON text under `key`.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        match self.backend.get(&self.full_key(key)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "error reading from storage");
                None
            }
        }
    }

    /// Serialize and store `value` under `key`.
    ///
    /// Returns whether the write reached the backend.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key, error = %e, "error serializing value for storage");
                return false;
            }
        };

        match self.backend.set(&self.full_key(key), &json) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "error saving to storage");
                false
            }
        }
    }

    /// Remove `key` from the namespace.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(&self.full_key(key)) {
            tracing::warn!(key, error = %e, "error removing from storage");
        }
    }

    /// Keys in this namespace, with the prefix stripped.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&self.prefix).map(String::from))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "error listing storage keys");
                Vec::new()
            }
        }
    }

    /// Remove every key in this namespace, leaving other keys in the backend alone.
    pub fn clear(&self) {
        for key in self.keys() {
            self.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UlimiError;
    use crate::features::sync::{
        ConnectivitySignal, EntityKind, LoopbackReconciler, NewOperation, SyncManager,
    };
    use serde_json::{json, Value};

    /// A backend whose disk is gone.
    struct Unavailable;

    impl KeyValueStore for Unavailable {
        fn get(&self, _key: &str) -> Result<Option<String>, UlimiError> {
            Err(UlimiError::Database("disk I/O error".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), UlimiError> {
            Err(UlimiError::Database("database or disk is full".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), UlimiError> {
            Err(UlimiError::Database("disk I/O error".to_string()))
        }

        fn keys(&self) -> Result<Vec<String>, UlimiError> {
            Err(UlimiError::Database("disk I/O error".to_string()))
        }
    }

    #[test]
    fn test_set_and_get_typed() {
        let storage = Storage::in_memory();

        assert!(storage.set("weather", &json!({"humidity": 65})));
        let weather: Value = storage.get("weather").unwrap();
        assert_eq!(weather["humidity"], 65);
    }

    #[test]
    fn test_keys_are_namespaced() {
        let backend = Arc::new(MemoryStore::new());
        let storage = Storage::new(backend.clone());

        storage.set("farms", &Vec::<Value>::new());
        assert_eq!(backend.keys().unwrap(), vec!["ulimi_farms"]);
        assert_eq!(storage.keys(), vec!["farms"]);
    }

    #[test]
    fn test_corrupt_value_reads_as_none() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("ulimi_tasks", "[{broken").unwrap();

        let storage = Storage::new(backend);
        assert!(storage.get::<Vec<Value>>("tasks").is_none());
        assert_eq!(storage.get_raw("tasks").as_deref(), Some("[{broken"));
    }

    #[test]
    fn test_wrong_shape_reads_as_none() {
        let storage = Storage::in_memory();
        storage.set("user", &json!({"name": "Natasha"}));

        assert!(storage.get::<Vec<String>>("user").is_none());
    }

    #[test]
    fn test_clear_only_touches_namespace() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("other_app_key", "1").unwrap();

        let storage = Storage::new(backend.clone());
        storage.set("farms", &json!([]));
        storage.set("tasks", &json!([]));
        storage.clear();

        assert!(storage.keys().is_empty());
        assert_eq!(backend.keys().unwrap(), vec!["other_app_key"]);
    }

    #[test]
    fn test_backend_failures_are_absorbed() {
        let storage = Storage::new(Arc::new(Unavailable));

        assert!(!storage.set("farms", &json!([])));
        assert!(storage.get::<Value>("farms").is_none());
        assert!(storage.get_raw("farms").is_none());
        assert!(storage.keys().is_empty());
        storage.remove("farms");
        storage.clear();
    }

    #[test]
    fn test_enqueue_survives_failing_backend() {
        let storage = Storage::new(Arc::new(Unavailable));
        let manager = SyncManager::new(
            storage,
            Arc::new(ConnectivitySignal::new(false)),
            Arc::new(LoopbackReconciler),
        );

        let id = manager.add_to_sync_queue(NewOperation::create(
            EntityKind::Task,
            "task1",
            json!({"title": "Test Task"}),
        ));

        let details = manager.sync_queue_details();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, id);
        assert!(manager.has_pending_sync());
    }
}
