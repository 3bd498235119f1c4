//! Errors surfaced by engine operations.

use crate::commit_queue::domain::CommitQueueDomainError;
use crate::commit_queue::ports::CommitQueueRepositoryError;
use crate::project::domain::ProjectDefinitionError;
use crate::project::ports::ProjectPolicyError;
use crate::rollup::ports::RollupRepositoryError;
use crate::task::domain::{BuildId, ProjectId, TaskDomainError, TaskId, TaskStatus, VersionId};
use crate::task::ports::TaskRepositoryError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse classification of an [`EngineError`], for callers that map
/// failures onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced document does not exist.
    NotFound,
    /// The request is not valid for the document's current state.
    InvalidState,
    /// The document store failed.
    Persistence,
    /// An external collaborator failed.
    Collaborator,
}

/// Errors returned by [`crate::engine::TaskGraphEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The build does not exist.
    #[error("build not found: {0}")]
    BuildNotFound(BuildId),

    /// The version does not exist.
    #[error("version not found: {0}")]
    VersionNotFound(VersionId),

    /// The patch does not exist.
    #[error("patch not found: {0}")]
    PatchNotFound(VersionId),

    /// The project has no commit queue.
    #[error("commit queue for project '{0}' not found")]
    CommitQueueNotFound(ProjectId),

    /// No commit queue item matches the identifier.
    #[error("commit queue item '{0}' not found")]
    CommitQueueItemNotFound(String),

    /// The version has no commit-queue merge task.
    #[error("no merge task found for version {0}")]
    MergeTaskNotFound(VersionId),

    /// The task cannot start in its current state.
    #[error("task {task_id} cannot start with status '{status}' (activated: {activated})")]
    NotStartable {
        /// The task asked to start.
        task_id: TaskId,
        /// Its current status.
        status: TaskStatus,
        /// Whether it is activated.
        activated: bool,
    },

    /// The task cannot be dispatched in its current state.
    #[error("task {task_id} cannot be dispatched with status '{status}'")]
    NotDispatchable {
        /// The task asked to dispatch.
        task_id: TaskId,
        /// Its current status.
        status: TaskStatus,
    },

    /// The task is not running, so an abort has nothing to stop.
    #[error("task {task_id} currently has status '{status}' - cannot abort task in this status")]
    NotAbortable {
        /// The task asked to abort.
        task_id: TaskId,
        /// Its current status.
        status: TaskStatus,
    },

    /// The task cannot be reset now.
    #[error("task {task_id} cannot be reset: {reason}")]
    NotResettable {
        /// The task asked to reset.
        task_id: TaskId,
        /// Why the reset was refused.
        reason: String,
    },

    /// Execution tasks are only reset through their display task.
    #[error("cannot restart execution task {0} because it is part of a display task")]
    ExecutionTaskOfDisplay(TaskId),

    /// The task is not an execution task of a display task.
    #[error("task {0} is not part of a display task")]
    NotExecutionTask(TaskId),

    /// The task group has no members.
    #[error("no tasks in task group '{group}' of build {build_id}")]
    EmptyTaskGroup {
        /// The build searched.
        build_id: BuildId,
        /// The group name.
        group: String,
    },

    /// A task rule was violated.
    #[error(transparent)]
    TaskDomain(#[from] TaskDomainError),

    /// A commit queue ordering rule was violated.
    #[error(transparent)]
    CommitQueueDomain(#[from] CommitQueueDomainError),

    /// A version definition was inconsistent.
    #[error(transparent)]
    Definition(#[from] ProjectDefinitionError),

    /// The task store failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),

    /// A build, version or patch store failed.
    #[error(transparent)]
    RollupRepository(#[from] RollupRepositoryError),

    /// The commit queue store failed.
    #[error(transparent)]
    CommitQueueRepository(#[from] CommitQueueRepositoryError),

    /// The project policy provider failed.
    #[error(transparent)]
    Policy(#[from] ProjectPolicyError),
}

impl EngineError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_)
            | Self::BuildNotFound(_)
            | Self::VersionNotFound(_)
            | Self::PatchNotFound(_)
            | Self::CommitQueueNotFound(_)
            | Self::CommitQueueItemNotFound(_)
            | Self::MergeTaskNotFound(_)
            | Self::TaskRepository(TaskRepositoryError::NotFound(_))
            | Self::RollupRepository(RollupRepositoryError::NotFound { .. })
            | Self::CommitQueueRepository(CommitQueueRepositoryError::NotFound(_))
            | Self::Policy(ProjectPolicyError::NotFound(_)) => ErrorKind::NotFound,
            Self::NotStartable { .. }
            | Self::NotDispatchable { .. }
            | Self::NotAbortable { .. }
            | Self::NotResettable { .. }
            | Self::ExecutionTaskOfDisplay(_)
            | Self::NotExecutionTask(_)
            | Self::EmptyTaskGroup { .. }
            | Self::TaskDomain(_)
            | Self::CommitQueueDomain(_)
            | Self::Definition(_)
            | Self::TaskRepository(TaskRepositoryError::DuplicateTask(_))
            | Self::RollupRepository(RollupRepositoryError::Duplicate { .. })
            | Self::CommitQueueRepository(CommitQueueRepositoryError::DuplicateQueue(_)) => {
                ErrorKind::InvalidState
            }
            Self::TaskRepository(TaskRepositoryError::Persistence(_))
            | Self::RollupRepository(RollupRepositoryError::Persistence(_))
            | Self::CommitQueueRepository(CommitQueueRepositoryError::Persistence(_)) => {
                ErrorKind::Persistence
            }
            Self::Policy(ProjectPolicyError::Provider(_)) => ErrorKind::Collaborator,
        }
    }
}
