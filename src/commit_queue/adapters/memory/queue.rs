//! In-memory commit queue repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::commit_queue::{
    domain::CommitQueue,
    ports::{CommitQueueRepository, CommitQueueRepositoryError, CommitQueueRepositoryResult},
};
use crate::task::domain::ProjectId;

/// Thread-safe in-memory commit queue repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCommitQueueRepository {
    queues: Arc<RwLock<HashMap<ProjectId, CommitQueue>>>,
}

impl InMemoryCommitQueueRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommitQueueRepository for InMemoryCommitQueueRepository {
    async fn store(&self, queue: &CommitQueue) -> CommitQueueRepositoryResult<()> {
        let mut queues = self.queues.write().map_err(|err| {
            CommitQueueRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if queues.contains_key(queue.project_id()) {
            return Err(CommitQueueRepositoryError::DuplicateQueue(
                queue.project_id().clone(),
            ));
        }
        queues.insert(queue.project_id().clone(), queue.clone());
        Ok(())
    }

    async fn update(&self, queue: &CommitQueue) -> CommitQueueRepositoryResult<()> {
        let mut queues = self.queues.write().map_err(|err| {
            CommitQueueRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let stored = queues
            .get_mut(queue.project_id())
            .ok_or_else(|| CommitQueueRepositoryError::NotFound(queue.project_id().clone()))?;
        *stored = queue.clone();
        Ok(())
    }

    async fn find_by_project(
        &self,
        project_id: &ProjectId,
    ) -> CommitQueueRepositoryResult<Option<CommitQueue>> {
        let queues = self.queues.read().map_err(|err| {
            CommitQueueRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(queues.get(project_id).cloned())
    }
}
