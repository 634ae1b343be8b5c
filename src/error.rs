//! Error types for ulimi.

use thiserror::Error;

/// Errors produced by the sync core, the record store and the CLI.
#[derive(Error, Debug)]
pub enum UlimiError {
    /// Configuration could not be read, parsed or resolved.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The SQLite-backed store failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A requested key or operation does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A sync was explicitly requested while the connectivity signal reports offline.
    #[error("Cannot sync while offline")]
    Offline,

    /// The reconciliation target rejected an operation.
    #[error("Reconciliation failed: {0}")]
    Reconcile(String),

    /// Transport error talking to the remote endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl UlimiError {
    /// Whether this error is the offline precondition violation.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }
}
