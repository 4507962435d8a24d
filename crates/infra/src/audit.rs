//! Audit trail: one entry per authorized call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_auth::Method;
use stockflow_core::{Page, PageRequest, ServiceError, ServiceResult};

use crate::store::StoreError;

/// Status recorded for calls that returned successfully.
pub const SUCCESS_STATUS: &str = "success";

/// An entry about to be appended. The sink assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAuditEntry {
    pub api_key: String,
    pub method: String,
    pub request_data: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub api_key: String,
    pub method: String,
    /// Request payload as serialized JSON text.
    pub request_data: String,
    /// `"success"` or the error code name.
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only audit storage.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append `entry`, returning its assigned id (monotonically increasing).
    async fn append(&self, entry: &NewAuditEntry) -> Result<i64, StoreError>;

    /// Entries recorded under `api_key`, newest first.
    async fn entries_for(
        &self,
        api_key: &str,
        page: PageRequest,
    ) -> Result<Page<AuditLogEntry>, StoreError>;
}

#[async_trait]
impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    async fn append(&self, entry: &NewAuditEntry) -> Result<i64, StoreError> {
        (**self).append(entry).await
    }

    async fn entries_for(
        &self,
        api_key: &str,
        page: PageRequest,
    ) -> Result<Page<AuditLogEntry>, StoreError> {
        (**self).entries_for(api_key, page).await
    }
}

/// Writes audit entries on behalf of the dispatcher.
///
/// Recording never changes the outcome of the audited call: write failures
/// and timeouts are logged and swallowed.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    timeout: Duration,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    /// Record the outcome of a call and wait for the write to finish.
    ///
    /// The write runs on its own task, so it completes even if the caller's
    /// future is dropped while waiting.
    pub async fn record(&self, api_key: &str, method: Method, request_data: String, status: &str) {
        let entry = NewAuditEntry {
            api_key: api_key.to_string(),
            method: method.as_str().to_string(),
            request_data,
            status: status.to_string(),
            timestamp: Utc::now(),
        };
        let sink = Arc::clone(&self.sink);
        let timeout = self.timeout;

        let write = tokio::spawn(async move {
            match tokio::time::timeout(timeout, sink.append(&entry)).await {
                Ok(Ok(id)) => {
                    tracing::debug!(audit_id = id, method = %entry.method, "audit entry recorded");
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, method = %entry.method, "failed to record audit entry");
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        method = %entry.method,
                        "audit write timed out"
                    );
                }
            }
        });

        if let Err(e) = write.await {
            tracing::warn!(error = %e, "audit task failed");
        }
    }

    /// Entries recorded under `api_key`, newest first.
    pub async fn entries_for(
        &self,
        api_key: &str,
        page: PageRequest,
    ) -> ServiceResult<Page<AuditLogEntry>> {
        self.sink.entries_for(api_key, page).await.map_err(|e| {
            tracing::error!(error = %e, "failed to fetch audit logs");
            ServiceError::internal("failed to fetch audit logs")
        })
    }
}
