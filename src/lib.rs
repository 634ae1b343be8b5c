//! ulimi - offline-first sync queue for the ULIMI farm dashboard
//!
//! Mutations made while the remote is unreachable are queued in a local
//! key-value store and replayed, in order, once connectivity returns.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::UlimiError;
pub use features::sync::{
    Connectivity, ConnectivitySignal, EntityKind, NewOperation, OperationStatus, OperationType,
    Reconciler, SyncManager, SyncOperation, SyncReport, SyncStatus,
};
pub use storage::{KeyValueStore, SqliteStore, Storage};
