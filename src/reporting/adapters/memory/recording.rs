//! Reporter that keeps every report it receives.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::reporting::{
    domain::StatusReport,
    ports::{StatusReporter, StatusReporterError, StatusReporterResult},
};

/// Thread-safe reporter recording reports in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RecordingStatusReporter {
    reports: Arc<RwLock<Vec<StatusReport>>>,
}

impl RecordingStatusReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the reports received so far.
    #[must_use]
    pub fn reports(&self) -> Vec<StatusReport> {
        self.reports
            .read()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StatusReporter for RecordingStatusReporter {
    async fn report(&self, report: StatusReport) -> StatusReporterResult<()> {
        let mut reports = self.reports.write().map_err(|err| {
            StatusReporterError::delivery(std::io::Error::other(err.to_string()))
        })?;
        reports.push(report);
        Ok(())
    }
}
