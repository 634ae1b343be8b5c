//! The sync queue manager.
//!
//! [`SyncManager`] is the one owner of the offline queue. UI code enqueues
//! every mutation through it, polls [`SyncManager::sync_status`], and asks
//! for reconciliation with [`SyncManager::force_sync`]. A background task
//! started by [`SyncManager::spawn_reconnect_listener`] runs a pass whenever
//! connectivity comes back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use super::connectivity::Connectivity;
use super::executor::{ExecutorConfig, SyncExecutor, SyncReport};
use super::operation::{NewOperation, SyncOperation};
use super::queue::SyncQueue;
use super::reconciler::Reconciler;
use crate::error::UlimiError;
use crate::storage::records::keys;
use crate::storage::Storage;

/// Snapshot of the sync state, derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_online: bool,
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    /// Operations pending or in flight
    pub pending_operations: usize,
    pub failed_operations: usize,
    pub sync_in_progress: bool,
    /// Queue time of the oldest pending or in-flight operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_pending: Option<DateTime<Utc>>,
}

struct Inner {
    queue: Mutex<SyncQueue>,
    storage: Storage,
    connectivity: Arc<dyn Connectivity>,
    reconciler: Arc<dyn Reconciler>,
    config: ExecutorConfig,
    pass_lock: tokio::sync::Mutex<()>,
    in_progress: AtomicBool,
}

/// Handle to the process-wide sync queue. Clones share the same queue.
#[derive(Clone)]
pub struct SyncManager {
    inner: Arc<Inner>,
}

/// Clears the in-progress flag when a pass ends, even by panic.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncManager {
    /// Create a manager with the default retry ceiling.
    ///
    /// The queue is loaded from `storage` immediately.
    #[must_use]
    pub fn new(
        storage: Storage,
        connectivity: Arc<dyn Connectivity>,
        reconciler: Arc<dyn Reconciler>,
    ) -> Self {
        Self::with_config(storage, connectivity, reconciler, ExecutorConfig::default())
    }

    /// Create a manager with custom config.
    #[must_use]
    pub fn with_config(
        storage: Storage,
        connectivity: Arc<dyn Connectivity>,
        reconciler: Arc<dyn Reconciler>,
        config: ExecutorConfig,
    ) -> Self {
        let queue = SyncQueue::load(storage.clone());
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(queue),
                storage,
                connectivity,
                reconciler,
                config,
                pass_lock: tokio::sync::Mutex::new(()),
                in_progress: AtomicBool::new(false),
            }),
        }
    }

    fn queue(&self) -> MutexGuard<'_, SyncQueue> {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a mutation and return its generated id.
    ///
    /// Never blocks on the network and never fails; persistence is
    /// best-effort. With `sync_on_enqueue` set, a pass is spawned on the
    /// current tokio runtime when online and idle; otherwise reconciliation
    /// waits for the next trigger.
    pub fn add_to_sync_queue(&self, operation: NewOperation) -> String {
        let id = self.queue().enqueue(operation);

        if self.inner.config.sync_on_enqueue
            && !self.is_offline_mode()
            && !self.inner.in_progress.load(Ordering::SeqCst)
        {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let manager = self.clone();
                    handle.spawn(async move {
                        manager.sync_pending().await;
                    });
                },
                Err(_) => tracing::debug!("no tokio runtime, leaving operation for the next pass"),
            }
        }

        id
    }

    /// Current status snapshot.
    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        let stats = self.queue().stats();
        SyncStatus {
            is_online: self.inner.connectivity.is_online(),
            last_sync_timestamp: self.inner.storage.get(keys::LAST_SYNC_TIMESTAMP),
            pending_operations: stats.pending + stats.in_flight,
            failed_operations: stats.failed,
            sync_in_progress: self.inner.in_progress.load(Ordering::SeqCst),
            oldest_pending: stats.oldest_pending,
        }
    }

    /// Every queued operation, failed ones included, in queue order.
    #[must_use]
    pub fn sync_queue_details(&self) -> Vec<SyncOperation> {
        self.queue().operations().to_vec()
    }

    /// Whether any operation is pending or in flight.
    #[must_use]
    pub fn has_pending_sync(&self) -> bool {
        self.queue().has_pending()
    }

    #[must_use]
    pub fn is_offline_mode(&self) -> bool {
        !self.inner.connectivity.is_online()
    }

    /// Run a reconciliation pass now.
    ///
    /// A call made while another pass is running waits for it and then runs
    /// its own pass over what is still pending.
    ///
    /// # Errors
    ///
    /// Returns [`UlimiError::Offline`] if connectivity is currently offline;
    /// the queue is left untouched. Individual operation failures do not
    /// make this fail.
    pub async fn force_sync(&self) -> Result<SyncReport, UlimiError> {
        if self.is_offline_mode() {
            return Err(UlimiError::Offline);
        }
        Ok(self.run_pass().await)
    }

    /// Run a pass if online; `None` when offline.
    pub async fn sync_pending(&self) -> Option<SyncReport> {
        if self.is_offline_mode() {
            tracing::debug!("skipping sync while offline");
            return None;
        }
        Some(self.run_pass().await)
    }

    async fn run_pass(&self) -> SyncReport {
        let _serialized = self.inner.pass_lock.lock().await;
        self.inner.in_progress.store(true, Ordering::SeqCst);
        let _flag = PassGuard(&self.inner.in_progress);

        let inner = &*self.inner;
        SyncExecutor::new(
            &inner.queue,
            &inner.storage,
            inner.connectivity.as_ref(),
            inner.reconciler.as_ref(),
            &inner.config,
        )
        .execute_pending()
        .await
    }

    /// Remove every failed operation; pending and in-flight ones stay.
    pub fn clear_failed_operations(&self) -> usize {
        let removed = self.queue().clear_failed();
        tracing::info!(removed, "cleared failed operations");
        removed
    }

    /// Give every failed operation a fresh retry budget.
    pub fn retry_failed_operations(&self) -> usize {
        let reset = self.queue().retry_failed();
        tracing::info!(reset, "reset failed operations for retry");
        reset
    }

    /// Run a pass on every offline-to-online transition.
    ///
    /// The connectivity source only publishes actual changes, so any
    /// notification that reads online follows an offline period, even when
    /// the offline value itself was overwritten before this task saw it.
    ///
    /// The task lives until aborted or until the connectivity source is
    /// dropped.
    #[must_use]
    pub fn spawn_reconnect_listener(&self) -> JoinHandle<()> {
        let manager = self.clone();
        let mut rx = self.inner.connectivity.subscribe();
        rx.borrow_and_update();

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if online {
                    tracing::info!("back online, syncing pending operations");
                    manager.sync_pending().await;
                }
            }
        })
    }

    /// Run a pass every `interval` while online and idle.
    #[must_use]
    pub fn spawn_periodic_sync(&self, interval: Duration) -> JoinHandle<()> {
        let manager = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if manager.inner.in_progress.load(Ordering::SeqCst) || !manager.has_pending_sync() {
                    continue;
                }
                manager.sync_pending().await;
            }
        })
    }
}
