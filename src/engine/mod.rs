//! The task graph engine.
//!
//! [`TaskGraphEngine`] drives every transition that spans documents: a task
//! finishing blocks its dependents, rolls status up into its build, version
//! and patch, may step back to an earlier revision, and may dequeue a
//! commit-queue item. Each operation re-fetches the documents it touches
//! through the repository ports and persists them one at a time, so the
//! engine itself holds no graph state.
//!
//! Operations are grouped by concern under [`services`].

mod error;
pub mod services;

#[cfg(test)]
mod tests;

pub use error::{EngineError, EngineResult, ErrorKind};
pub use services::{MarkEndRequest, ResetRequest, StatusChanges};

use crate::commit_queue::adapters::memory::InMemoryCommitQueueRepository;
use crate::commit_queue::domain::CommitQueue;
use crate::commit_queue::ports::CommitQueueRepository;
use crate::config::EngineConfig;
use crate::project::domain::ProjectPolicy;
use crate::project::ports::ProjectPolicyProvider;
use crate::reporting::domain::StatusReport;
use crate::reporting::ports::StatusReporter;
use crate::rollup::adapters::memory::{
    InMemoryBuildRepository, InMemoryPatchRepository, InMemoryVersionRepository,
};
use crate::rollup::domain::{Build, Patch, Version};
use crate::rollup::ports::{BuildRepository, PatchRepository, VersionRepository};
use crate::task::adapters::memory::InMemoryTaskRepository;
use crate::task::domain::{BuildId, ProjectId, Task, TaskId, VersionId};
use crate::task::ports::TaskRepository;
use mockable::Clock;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// The document stores the engine reads and writes.
#[derive(Clone)]
pub struct EngineStores {
    /// Task documents and their archived executions.
    pub tasks: Arc<dyn TaskRepository>,
    /// Build documents.
    pub builds: Arc<dyn BuildRepository>,
    /// Version documents.
    pub versions: Arc<dyn VersionRepository>,
    /// Patch documents.
    pub patches: Arc<dyn PatchRepository>,
    /// Commit queues, one per project.
    pub commit_queues: Arc<dyn CommitQueueRepository>,
}

impl EngineStores {
    /// Creates empty in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            tasks: Arc::new(InMemoryTaskRepository::new()),
            builds: Arc::new(InMemoryBuildRepository::new()),
            versions: Arc::new(InMemoryVersionRepository::new()),
            patches: Arc::new(InMemoryPatchRepository::new()),
            commit_queues: Arc::new(InMemoryCommitQueueRepository::new()),
        }
    }
}

/// Orchestrates task, build, version, patch and commit-queue documents.
pub struct TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    stores: EngineStores,
    policies: Arc<dyn ProjectPolicyProvider>,
    reporter: Arc<dyn StatusReporter>,
    config: EngineConfig,
    clock: Arc<C>,
}

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(
        stores: EngineStores,
        policies: Arc<dyn ProjectPolicyProvider>,
        reporter: Arc<dyn StatusReporter>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            stores,
            policies,
            reporter,
            config: EngineConfig::default(),
            clock,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the document stores.
    #[must_use]
    pub const fn stores(&self) -> &EngineStores {
        &self.stores
    }

    /// Returns the configuration in force.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn fetch_task(&self, id: &TaskId) -> EngineResult<Task> {
        self.stores
            .tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| EngineError::TaskNotFound(id.clone()))
    }

    async fn fetch_build(&self, id: &BuildId) -> EngineResult<Build> {
        self.stores
            .builds
            .find_by_id(id)
            .await?
            .ok_or_else(|| EngineError::BuildNotFound(id.clone()))
    }

    async fn fetch_version(&self, id: &VersionId) -> EngineResult<Version> {
        self.stores
            .versions
            .find_by_id(id)
            .await?
            .ok_or_else(|| EngineError::VersionNotFound(id.clone()))
    }

    async fn fetch_patch(&self, id: &VersionId) -> EngineResult<Patch> {
        self.stores
            .patches
            .find_by_id(id)
            .await?
            .ok_or_else(|| EngineError::PatchNotFound(id.clone()))
    }

    async fn fetch_commit_queue(&self, project_id: &ProjectId) -> EngineResult<CommitQueue> {
        self.stores
            .commit_queues
            .find_by_project(project_id)
            .await?
            .ok_or_else(|| EngineError::CommitQueueNotFound(project_id.clone()))
    }

    async fn fetch_merge_task(&self, version_id: &VersionId) -> EngineResult<Task> {
        self.stores
            .tasks
            .find_merge_task_for_version(version_id)
            .await?
            .ok_or_else(|| EngineError::MergeTaskNotFound(version_id.clone()))
    }

    async fn policy_for(&self, task: &Task) -> EngineResult<ProjectPolicy> {
        Ok(self
            .policies
            .policy(task.project_id(), task.version_id())
            .await?)
    }

    async fn report(&self, report: StatusReport) {
        let version_id = report.version_id.clone();
        let status = report.status;
        if let Err(err) = self.reporter.report(report).await {
            warn!(
                version_id = %version_id,
                status = %status,
                error = %err,
                "unable to send status report"
            );
        }
    }

    fn warn_if_slow(&self, operation: &'static str, step: &'static str, task_id: &TaskId, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed > self.config.slow_operation_threshold() {
            warn!(
                operation,
                step,
                task_id = %task_id,
                duration_ms = elapsed.as_millis(),
                "slow operation"
            );
        }
    }
}
