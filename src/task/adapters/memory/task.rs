//! In-memory task repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{BuildId, Task, TaskId, TaskRunKey, TaskStatus, VersionId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    archived: HashMap<TaskId, Vec<Task>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn collect_matching(state: &InMemoryTaskState, predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
    let mut tasks: Vec<Task> = state
        .tasks
        .values()
        .filter(|task| predicate(task))
        .cloned()
        .collect();
    tasks.sort_by(|left, right| left.id().cmp(right.id()));
    tasks
}

fn matches_run_key(task: &Task, key: &TaskRunKey) -> bool {
    task.project_id() == &key.project_id
        && task.build_variant() == key.build_variant
        && task.display_name() == key.display_name
        && key
            .requester
            .is_none_or(|requester| requester == task.requester())
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id().clone()));
        }
        state.tasks.insert(task.id().clone(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(task.id())
            .ok_or_else(|| TaskRepositoryError::NotFound(task.id().clone()))?;
        *stored = task.clone();
        Ok(())
    }

    async fn update_if_status(
        &self,
        task: &Task,
        expected: TaskStatus,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(task.id())
            .ok_or_else(|| TaskRepositoryError::NotFound(task.id().clone()))?;
        if stored.status() != expected || stored.execution() != task.execution() {
            return Ok(false);
        }
        *stored = task.clone();
        Ok(true)
    }

    async fn archive(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .archived
            .entry(task.id().clone())
            .or_default()
            .push(task.clone());
        Ok(())
    }

    async fn find_archived(&self, id: &TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.archived.get(id).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, id: &TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[TaskId]) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect())
    }

    async fn find_by_build(&self, build_id: &BuildId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(collect_matching(&state, |task| task.build_id() == build_id))
    }

    async fn find_by_version(&self, version_id: &VersionId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(collect_matching(&state, |task| {
            task.version_id() == version_id
        }))
    }

    async fn find_dependents(&self, task_id: &TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(collect_matching(&state, |task| {
            task.dependency_on(task_id).is_some()
        }))
    }

    async fn find_task_group(
        &self,
        build_id: &BuildId,
        group: &str,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut members = collect_matching(&state, |task| {
            task.build_id() == build_id && task.task_group_name() == Some(group)
        });
        members.sort_by_key(|task| task.task_group().map_or(0, |membership| membership.order));
        Ok(members)
    }

    async fn find_runs_before(
        &self,
        key: &TaskRunKey,
        before: u64,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut runs = collect_matching(&state, |task| {
            matches_run_key(task, key) && task.revision_order_number() < before
        });
        runs.sort_by(|left, right| {
            right
                .revision_order_number()
                .cmp(&left.revision_order_number())
        });
        Ok(runs)
    }

    async fn find_merge_task_for_version(
        &self,
        version_id: &VersionId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(collect_matching(&state, |task| {
            task.version_id() == version_id && task.is_commit_queue_merge()
        })
        .into_iter()
        .next())
    }
}
