//! Repository port for task persistence and graph lookups.

use crate::task::domain::{BuildId, Task, TaskId, TaskRunKey, TaskStatus, VersionId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Every method reads or writes whole documents. Callers must re-fetch a
/// task before mutating it when another step may have changed it.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Replaces an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Replaces an existing task only while the stored copy still has
    /// `expected` status and the same execution number.
    ///
    /// Returns `false` when the guard did not match and nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update_if_status(&self, task: &Task, expected: TaskStatus)
    -> TaskRepositoryResult<bool>;

    /// Keeps a snapshot of the task's current execution before it is reset.
    async fn archive(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Returns archived executions of a task, oldest first.
    async fn find_archived(&self, id: &TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: &TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Finds every task in `ids` that exists, in no particular order.
    async fn find_by_ids(&self, ids: &[TaskId]) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns every task in a build.
    async fn find_by_build(&self, build_id: &BuildId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns every task in a version.
    async fn find_by_version(&self, version_id: &VersionId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns every task with a dependency edge onto `task_id`.
    async fn find_dependents(&self, task_id: &TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the members of a task group in a build, ordered by their
    /// position in the group.
    async fn find_task_group(
        &self,
        build_id: &BuildId,
        group: &str,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns earlier runs of the same task with a revision order strictly
    /// below `before`, most recent first.
    async fn find_runs_before(
        &self,
        key: &TaskRunKey,
        before: u64,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the commit-queue merge task of a version, if one exists.
    async fn find_merge_task_for_version(
        &self,
        version_id: &VersionId,
    ) -> TaskRepositoryResult<Option<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
