//! Offline sync queue.
//!
//! Mutations made while offline (or at any time) are queued locally and
//! reconciled with the remote store when connectivity allows.
//!
//! Features:
//! - Insertion-ordered queue persisted under the `sync_queue` key
//! - Bounded retries; exhausted operations are kept as failed for inspection
//! - Automatic pass on reconnect, explicit `force_sync`, optional periodic pass
//! - Reconciled operations are applied to the local record collections

pub mod connectivity;
pub mod executor;
pub mod manager;
pub mod operation;
pub mod queue;
pub mod reconciler;

pub use connectivity::{Connectivity, ConnectivitySignal, HttpProbe};
pub use executor::{
    format_sync_report, ExecutionResult, ExecutorConfig, SyncReport, DEFAULT_MAX_RETRIES,
};
pub use manager::{SyncManager, SyncStatus};
pub use operation::{EntityKind, NewOperation, OperationStatus, OperationType, SyncOperation};
pub use queue::{QueueStats, SyncQueue};
pub use reconciler::{HttpReconciler, LoopbackReconciler, Reconciler};
