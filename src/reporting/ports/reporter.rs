//! Status reporter port.

use crate::reporting::domain::StatusReport;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for status reporting.
pub type StatusReporterResult<T> = Result<T, StatusReporterError>;

/// Receives final disposition notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusReporter: Send + Sync {
    /// Delivers one report.
    ///
    /// # Errors
    ///
    /// Returns [`StatusReporterError`] when the report could not be handed
    /// off. The engine logs such errors and carries on.
    async fn report(&self, report: StatusReport) -> StatusReporterResult<()>;
}

/// Errors returned by status reporters.
#[derive(Debug, Clone, Error)]
pub enum StatusReporterError {
    /// The receiver rejected the report.
    #[error("status report rejected: {0}")]
    Rejected(String),

    /// The report could not be delivered.
    #[error("status report delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl StatusReporterError {
    /// Wraps a delivery error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
