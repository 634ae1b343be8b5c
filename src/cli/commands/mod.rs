//! Command implementations for ulimi.
//!
//! Every command opens an [`App`]: the loaded config, the on-disk store,
//! a connectivity signal and the sync manager wired to them.

mod data;
mod sync;

use std::path::PathBuf;
use std::sync::Arc;

pub use data::{get_value, list_keys, seed, show_config};
pub use sync::{add_operation, clear_failed, force_sync, list_operations, retry_failed, status, watch};

use crate::config::{Config, Paths};
use crate::error::UlimiError;
use crate::features::sync::{
    Connectivity, ConnectivitySignal, HttpProbe, HttpReconciler, LoopbackReconciler, Reconciler, SyncManager,
};
use crate::storage::{SqliteStore, Storage};

/// Everything a command needs, wired from config.
pub struct App {
    pub config: Config,
    pub storage: Storage,
    pub signal: ConnectivitySignal,
    pub manager: SyncManager,
}

impl App {
    /// Open the store under `home` (or the default data directory).
    ///
    /// Connectivity starts offline when `offline` is set or the config says
    /// so; otherwise a configured health URL is probed once, and without one
    /// the remote is assumed reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed, the store cannot be
    /// opened, or an HTTP client cannot be built.
    pub async fn open(home: Option<PathBuf>, offline: bool) -> Result<Self, UlimiError> {
        let paths = match home {
            Some(root) => Paths::with_root(root),
            None => Paths::new()?,
        };
        paths.ensure_dirs()?;

        let config = Config::load_from_path(&paths.config_file)?;
        let store = SqliteStore::open_at(&paths.database)?;
        let storage = Storage::with_namespace(Arc::new(store), config.storage.namespace.clone());

        let signal = ConnectivitySignal::new(!(offline || config.sync.start_offline));
        if signal.is_online() {
            if let Some(url) = &config.sync.health_url {
                HttpProbe::new(url.as_str(), config.sync.request_timeout(), signal.clone())?
                    .probe_once()
                    .await;
            }
        }

        let reconciler: Arc<dyn Reconciler> = match &config.sync.remote_endpoint {
            Some(endpoint) => Arc::new(HttpReconciler::new(endpoint, config.sync.request_timeout())?),
            None => {
                tracing::info!("no remote endpoint configured, acknowledging operations locally");
                Arc::new(LoopbackReconciler)
            },
        };

        let manager = SyncManager::with_config(
            storage.clone(),
            Arc::new(signal.clone()),
            reconciler,
            config.sync.executor_config(),
        );

        Ok(Self {
            config,
            storage,
            signal,
            manager,
        })
    }
}
