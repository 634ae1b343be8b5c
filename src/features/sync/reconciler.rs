//! Reconciliation targets.
//!
//! A [`Reconciler`] delivers one queued operation to the remote side. Any
//! error it returns counts as a transient failure of that operation only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use super::operation::{OperationType, SyncOperation};
use crate::error::UlimiError;

/// Delivers queued operations to the remote store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Apply `operation` remotely.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote did not accept the operation.
    async fn dispatch(&self, operation: &SyncOperation) -> Result<(), UlimiError>;
}

/// Acknowledges every operation without contacting anything.
///
/// Used when no remote endpoint is configured, so queued work still drains
/// into the local records.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackReconciler;

#[async_trait]
impl Reconciler for LoopbackReconciler {
    async fn dispatch(&self, operation: &SyncOperation) -> Result<(), UlimiError> {
        tracing::debug!(id = %operation.id, "acknowledged locally");
        Ok(())
    }
}

/// REST reconciler: one request per operation.
///
/// - create: `POST {endpoint}/{collection}`
/// - update: `PUT {endpoint}/{collection}/{entity_id}`
/// - delete: `DELETE {endpoint}/{collection}/{entity_id}`
#[derive(Debug, Clone)]
pub struct HttpReconciler {
    client: Client,
    endpoint: String,
}

impl HttpReconciler {
    /// Create a reconciler for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, UlimiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Method and URL for an operation.
    #[must_use]
    pub fn route(&self, operation: &SyncOperation) -> (Method, String) {
        let collection = operation.entity.collection();
        match operation.operation_type {
            OperationType::Create => (Method::POST, format!("{}/{collection}", self.endpoint)),
            OperationType::Update => (
                Method::PUT,
                format!("{}/{collection}/{}", self.endpoint, operation.entity_id),
            ),
            OperationType::Delete => (
                Method::DELETE,
                format!("{}/{collection}/{}", self.endpoint, operation.entity_id),
            ),
        }
    }
}

#[async_trait]
impl Reconciler for HttpReconciler {
    async fn dispatch(&self, operation: &SyncOperation) -> Result<(), UlimiError> {
        let (method, url) = self.route(operation);
        tracing::debug!(id = %operation.id, %method, %url, "dispatching operation");

        let mut request = self
            .client
            .request(method, &url)
            .header("Idempotency-Key", operation.id.as_str());
        if operation.operation_type != OperationType::Delete {
            request = request.json(&operation.data);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(UlimiError::Reconcile(format!("{url} responded {status}")))
        }
    }
}
