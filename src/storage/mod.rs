//! Storage layer for ulimi.
//!
//! Everything the dashboard persists lives in one key-value namespace:
//! - record collections (farms, tasks, orders, marketplace, ...)
//! - the sync queue (`sync_queue`)
//! - the last successful sync time (`last_sync_timestamp`)
//!
//! [`SqliteStore`] is the durable backend, [`MemoryStore`] the ephemeral one.

mod database;
mod kv;
mod migrations;
pub mod records;
mod store;

pub use database::SqliteStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use store::{Storage, DEFAULT_NAMESPACE};
