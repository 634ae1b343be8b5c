//! `SQLite`-backed key-value store.
//!
//! The database lives at `~/.ulimi/ulimi.db` and holds a single `kv_store`
//! table keyed by namespaced record names.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::UlimiError;

use super::kv::KeyValueStore;
use super::migrations;

/// Durable key-value store over a `SQLite` connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store at a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, UlimiError> {
        let conn = Connection::open(path).map_err(|e| {
            UlimiError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, UlimiError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            UlimiError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, UlimiError> {
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, UlimiError> {
        migrations::get_version(&self.connection())
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, UlimiError> {
        self.connection()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| UlimiError::Database(format!("Failed to read {key}: {e}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), UlimiError> {
        self.connection()
            .execute(
                r"INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                 updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| UlimiError::Database(format!("Failed to write {key}: {e}")))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), UlimiError> {
        self.connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(|e| UlimiError::Database(format!("Failed to remove {key}: {e}")))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, UlimiError> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare("SELECT key FROM kv_store ORDER BY key")
            .map_err(|e| UlimiError::Database(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| UlimiError::Database(format!("Failed to list keys: {e}")))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row.map_err(|e| UlimiError::Database(e.to_string()))?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = SqliteStore::open_in_memory().unwrap();
        assert!(db.schema_version().unwrap() > 0);
    }

    #[test]
    fn test_set_get_overwrite_remove() {
        let db = SqliteStore::open_in_memory().unwrap();

        assert_eq!(db.get("ulimi_farms").unwrap(), None);

        db.set("ulimi_farms", "[]").unwrap();
        db.set("ulimi_farms", "[{\"id\":\"farm1\"}]").unwrap();
        assert_eq!(
            db.get("ulimi_farms").unwrap().as_deref(),
            Some("[{\"id\":\"farm1\"}]")
        );

        db.remove("ulimi_farms").unwrap();
        assert_eq!(db.get("ulimi_farms").unwrap(), None);
    }

    #[test]
    fn test_keys_sorted() {
        let db = SqliteStore::open_in_memory().unwrap();
        db.set("ulimi_tasks", "[]").unwrap();
        db.set("ulimi_farms", "[]").unwrap();

        assert_eq!(db.keys().unwrap(), vec!["ulimi_farms", "ulimi_tasks"]);
    }

    #[test]
    fn test_reopen_keeps_values() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let db = SqliteStore::open_at(&db_path).unwrap();
            db.set("ulimi_user", "{\"name\":\"Mirriam\"}").unwrap();
        }

        {
            let db = SqliteStore::open_at(&db_path).unwrap();
            assert!(db.schema_version().unwrap() > 0);
            assert_eq!(
                db.get("ulimi_user").unwrap().as_deref(),
                Some("{\"name\":\"Mirriam\"}")
            );
        }
    }
}
