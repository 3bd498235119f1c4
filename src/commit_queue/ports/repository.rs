//! Repository port for commit queues.

use crate::commit_queue::domain::CommitQueue;
use crate::task::domain::ProjectId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for commit queue repository operations.
pub type CommitQueueRepositoryResult<T> = Result<T, CommitQueueRepositoryError>;

/// Commit queue persistence contract, one document per project.
#[async_trait]
pub trait CommitQueueRepository: Send + Sync {
    /// Stores a new queue.
    ///
    /// # Errors
    ///
    /// Returns [`CommitQueueRepositoryError::DuplicateQueue`] when the
    /// project already has a queue.
    async fn store(&self, queue: &CommitQueue) -> CommitQueueRepositoryResult<()>;

    /// Replaces an existing queue.
    ///
    /// # Errors
    ///
    /// Returns [`CommitQueueRepositoryError::NotFound`] when the project has
    /// no queue.
    async fn update(&self, queue: &CommitQueue) -> CommitQueueRepositoryResult<()>;

    /// Finds a project's queue.
    async fn find_by_project(
        &self,
        project_id: &ProjectId,
    ) -> CommitQueueRepositoryResult<Option<CommitQueue>>;
}

/// Errors returned by commit queue repository implementations.
#[derive(Debug, Clone, Error)]
pub enum CommitQueueRepositoryError {
    /// The project already has a queue.
    #[error("commit queue already exists for project {0}")]
    DuplicateQueue(ProjectId),

    /// The project has no queue.
    #[error("commit queue not found for project {0}")]
    NotFound(ProjectId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CommitQueueRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
