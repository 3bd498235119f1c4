//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// An end detail was built with a status that does not finish a task.
    #[error("status '{0}' does not finish a task")]
    UnfinishedEndStatus(TaskStatus),

    /// A task was defined with an empty display name.
    #[error("task display name must not be empty")]
    EmptyDisplayName,

    /// A task was defined with an empty build variant.
    #[error("build variant must not be empty")]
    EmptyBuildVariant,

    /// A task was defined as depending on itself.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    /// The dependency edge does not exist on the task.
    #[error("task {task_id} has no dependency on {dependency_id}")]
    MissingDependency {
        /// Task owning the edge list.
        task_id: TaskId,
        /// Target of the missing edge.
        dependency_id: TaskId,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing dependency requirements.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown required dependency status: {0}")]
pub struct ParseRequiredStatusError(pub String);
