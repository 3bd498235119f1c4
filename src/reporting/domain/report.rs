//! The notification sent to external status consumers.

use crate::rollup::domain::{BuildStatus, VersionStatus};
use crate::task::domain::VersionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status as understood by external commit-status consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalStatus {
    /// Work is queued or running.
    Pending,
    /// Work finished successfully.
    Success,
    /// Work finished with failures.
    Failure,
    /// Work could not be carried out.
    Error,
}

impl ExternalStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ExternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BuildStatus> for ExternalStatus {
    fn from(status: BuildStatus) -> Self {
        match status {
            BuildStatus::Created | BuildStatus::Started => Self::Pending,
            BuildStatus::Succeeded => Self::Success,
            BuildStatus::Failed => Self::Failure,
        }
    }
}

impl From<VersionStatus> for ExternalStatus {
    fn from(status: VersionStatus) -> Self {
        match status {
            VersionStatus::Created | VersionStatus::Started => Self::Pending,
            VersionStatus::Succeeded => Self::Success,
            VersionStatus::Failed => Self::Failure,
        }
    }
}

/// A `(version, status, reason)` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Version the report is about.
    pub version_id: VersionId,
    /// Reported status.
    pub status: ExternalStatus,
    /// Human-readable reason.
    pub reason: String,
}

impl StatusReport {
    /// Creates a report.
    #[must_use]
    pub fn new(version_id: VersionId, status: ExternalStatus, reason: impl Into<String>) -> Self {
        Self {
            version_id,
            status,
            reason: reason.into(),
        }
    }
}
