//! Online/offline signal consumed by the sync manager.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Source of the current reachability state and its transitions.
pub trait Connectivity: Send + Sync {
    /// Whether the remote is currently considered reachable.
    fn is_online(&self) -> bool;

    /// A receiver that observes every subsequent state change.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Settable connectivity state backed by a watch channel.
///
/// The embedding application (or an [`HttpProbe`]) calls
/// [`ConnectivitySignal::set_online`] on every reachability change.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivitySignal {
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Report the current state; subscribers are only woken on a change.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(online, "connectivity changed");
        }
    }
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ConnectivitySignal {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Polls a health URL and feeds the result into a [`ConnectivitySignal`].
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
    signal: ConnectivitySignal,
}

impl HttpProbe {
    /// Create a probe against `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        signal: ConnectivitySignal,
    ) -> Result<Self, crate::error::UlimiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            signal,
        })
    }

    /// Check reachability once and update the signal.
    pub async fn probe_once(&self) -> bool {
        let online = match self.client.get(&self.url).send().await {
            Ok(resp) => !resp.status().is_server_error(),
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "health probe failed");
                false
            },
        };
        self.signal.set_online(online);
        online
    }

    /// Probe every `interval` until the returned task is aborted.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.probe_once().await;
            }
        })
    }
}
