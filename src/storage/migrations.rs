//! Database migrations for the ulimi store.
//!
//! Each migration upgrades the schema by one version and is applied
//! automatically when the database is opened.

use rusqlite::Connection;

use crate::error::UlimiError;

/// Current schema version.
const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 for a new database.
pub fn get_version(conn: &Connection) -> Result<i32, UlimiError> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| UlimiError::Database(format!("Failed to get schema version: {e}")))?;

    Ok(version)
}

fn set_version(conn: &Connection, version: i32) -> Result<(), UlimiError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| UlimiError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), UlimiError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), UlimiError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(UlimiError::Database(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: key-value table.
///
/// Every record collection, the sync queue and the last-sync timestamp are
/// stored as JSON text under a namespaced key.
fn migrate_v1(conn: &Connection) -> Result<(), UlimiError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| UlimiError::Database(format!("Migration v1 failed: {e}")))
}
