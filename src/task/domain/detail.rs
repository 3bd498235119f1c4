//! Value types recorded on a task while it runs and finishes.

use super::{Activator, RequiredStatus, TaskDomainError, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

/// Description recorded when a task must have results but reported none.
pub const NO_RESULTS_DESCRIPTION: &str = "no test results were found";

/// Description recorded when recorded test failures override the reported
/// status.
pub const FAILED_TESTS_DESCRIPTION: &str = "test results contain failures";

/// Description recorded when an aborted task reports success.
pub const ABORTED_DESCRIPTION: &str = "task was aborted";

/// Description recorded when automation exhausts a task's executions.
pub const EXECUTION_CAP_DESCRIPTION: &str = "task reached its maximum number of executions";

/// How a task execution ended, as reported by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEndDetail {
    status: TaskStatus,
    description: Option<String>,
    timed_out: bool,
}

impl TaskEndDetail {
    /// Creates an end detail with a terminal status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnfinishedEndStatus`] when `status` is not a
    /// terminal status.
    pub const fn new(status: TaskStatus) -> Result<Self, TaskDomainError> {
        if !status.is_finished() {
            return Err(TaskDomainError::UnfinishedEndStatus(status));
        }
        Ok(Self {
            status,
            description: None,
            timed_out: false,
        })
    }

    /// Shorthand for a successful end.
    #[must_use]
    pub const fn succeeded() -> Self {
        Self {
            status: TaskStatus::Succeeded,
            description: None,
            timed_out: false,
        }
    }

    /// Shorthand for a plain failure.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            status: TaskStatus::Failed,
            description: None,
            timed_out: false,
        }
    }

    /// Shorthand for a system failure.
    #[must_use]
    pub const fn system_failed() -> Self {
        Self {
            status: TaskStatus::SystemFailed,
            description: None,
            timed_out: false,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the end as caused by a timeout.
    #[must_use]
    pub const fn with_timeout(mut self) -> Self {
        self.timed_out = true;
        self
    }

    /// Returns the reported status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns `true` when the task timed out.
    #[must_use]
    pub const fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Replaces the status and description, keeping the timeout flag.
    pub(crate) fn downgrade(&mut self, status: TaskStatus, description: &str) {
        self.status = status;
        self.description = Some(description.to_owned());
    }
}

/// Who aborted a task and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortInfo {
    /// The actor that requested the abort.
    pub by: Activator,
    /// The task whose failure caused the abort, if any.
    pub task_id: Option<TaskId>,
}

impl AbortInfo {
    /// Creates abort info for a direct request.
    #[must_use]
    pub const fn by(by: Activator) -> Self {
        Self { by, task_id: None }
    }

    /// Records the task whose failure caused the abort.
    #[must_use]
    pub fn caused_by(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }
}

/// Host a task has been dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAssignment {
    /// Host identifier.
    pub host_id: String,
    /// Distro the host runs.
    pub distro_id: String,
    /// Agent revision running on the host.
    pub agent_revision: String,
}

impl HostAssignment {
    /// Creates a host assignment.
    #[must_use]
    pub fn new(
        host_id: impl Into<String>,
        distro_id: impl Into<String>,
        agent_revision: impl Into<String>,
    ) -> Self {
        Self {
            host_id: host_id.into(),
            distro_id: distro_id.into(),
            agent_revision: agent_revision.into(),
        }
    }
}

/// A dependency edge from the owning task onto `task_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The task depended on.
    pub task_id: TaskId,
    /// The status the target must finish with.
    pub status: RequiredStatus,
    /// Set once the target finished, or became blocked, without meeting
    /// `status`.
    pub unattainable: bool,
    /// Cached copy of whether the target has finished.
    pub finished: bool,
}

impl Dependency {
    /// Creates an open edge onto `task_id`.
    #[must_use]
    pub const fn new(task_id: TaskId, status: RequiredStatus) -> Self {
        Self {
            task_id,
            status,
            unattainable: false,
            finished: false,
        }
    }

    /// Shorthand for an edge requiring success.
    #[must_use]
    pub const fn on_success(task_id: TaskId) -> Self {
        Self::new(task_id, RequiredStatus::Succeeded)
    }
}
