//! Task lifecycle statuses and dependency requirements.

use super::{ParseRequiredStatusError, ParseTaskStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored lifecycle status of a task execution.
///
/// `undispatched → dispatched → started → {succeeded, failed, setup_failed,
/// system_failed}`. Whether a task is blocked is derived from its dependency
/// edges and is never stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be picked up by a host.
    Undispatched,
    /// Assigned to a host but not yet running.
    Dispatched,
    /// Running on a host.
    Started,
    /// Finished successfully.
    Succeeded,
    /// Finished with a test or command failure.
    Failed,
    /// Finished with a failure in setup commands.
    SetupFailed,
    /// Finished with a system or infrastructure failure.
    SystemFailed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undispatched => "undispatched",
            Self::Dispatched => "dispatched",
            Self::Started => "started",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::SetupFailed => "setup_failed",
            Self::SystemFailed => "system_failed",
        }
    }

    /// Returns `true` for every terminal status.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::SetupFailed | Self::SystemFailed
        )
    }

    /// Returns `true` for every failing terminal status.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::SetupFailed | Self::SystemFailed)
    }

    /// Returns `true` while the task has not left its initial state.
    #[must_use]
    pub const fn is_unstarted(self) -> bool {
        matches!(self, Self::Undispatched)
    }

    /// Returns `true` while a host holds the task.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::Dispatched | Self::Started)
    }

    /// Rank used to choose which execution task speaks for a display task.
    ///
    /// Lower ranks win. Failures outrank running work, which outranks queued
    /// work, which outranks success.
    #[must_use]
    pub const fn display_rank(self) -> u8 {
        match self {
            Self::Failed => 10,
            Self::SystemFailed => 30,
            Self::SetupFailed => 60,
            Self::Started => 70,
            Self::Dispatched => 75,
            Self::Undispatched => 80,
            Self::Succeeded => 100,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "undispatched" => Ok(Self::Undispatched),
            "dispatched" => Ok(Self::Dispatched),
            "started" => Ok(Self::Started),
            "succeeded" | "success" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "setup_failed" => Ok(Self::SetupFailed),
            "system_failed" => Ok(Self::SystemFailed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Status a dependency target must finish with for the edge to be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredStatus {
    /// The target must succeed.
    Succeeded,
    /// The target must fail, with any failing variant.
    Failed,
    /// The target only has to finish.
    Any,
}

impl RequiredStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Any => "*",
        }
    }

    /// Returns `true` when a target finishing with `status` meets this
    /// requirement. Unfinished statuses never do.
    #[must_use]
    pub const fn is_satisfied_by(self, status: TaskStatus) -> bool {
        match self {
            Self::Succeeded => matches!(status, TaskStatus::Succeeded),
            Self::Failed => status.is_failure(),
            Self::Any => status.is_finished(),
        }
    }
}

impl fmt::Display for RequiredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RequiredStatus {
    type Error = ParseRequiredStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "succeeded" | "success" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "*" | "any" => Ok(Self::Any),
            _ => Err(ParseRequiredStatusError(value.to_owned())),
        }
    }
}
