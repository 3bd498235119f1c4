//! Reporter that only writes reports to the log.

use async_trait::async_trait;
use tracing::info;

use crate::reporting::{
    domain::StatusReport,
    ports::{StatusReporter, StatusReporterResult},
};

/// Logs every report at `info` level and drops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatusReporter;

#[async_trait]
impl StatusReporter for TracingStatusReporter {
    async fn report(&self, report: StatusReport) -> StatusReporterResult<()> {
        info!(
            version_id = %report.version_id,
            status = %report.status,
            reason = %report.reason,
            "status report"
        );
        Ok(())
    }
}
