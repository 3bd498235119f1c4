//! Shared helpers for in-memory engine integration tests.

use buildgraph::engine::{EngineStores, MarkEndRequest, TaskGraphEngine};
use buildgraph::project::adapters::memory::StaticProjectPolicyProvider;
use buildgraph::project::domain::{
    ProjectPolicy, TaskUnitDefinition, VariantDefinition, VersionDefinition,
};
use buildgraph::reporting::adapters::memory::RecordingStatusReporter;
use buildgraph::rollup::domain::{Build, Version};
use buildgraph::task::domain::{
    Activator, BuildId, ProjectId, Requester, Task, TaskEndDetail, TaskId, VersionId,
};
use eyre::eyre;
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;

/// Project every scenario runs under.
pub const PROJECT: &str = "core";

/// Variant used by single-variant versions.
pub const VARIANT: &str = "ubuntu2204";

/// Engine type used by the integration tests.
pub type TestEngine = TaskGraphEngine<DefaultClock>;

/// An engine over fresh in-memory stores.
pub struct Scenario {
    pub engine: TestEngine,
    pub reporter: Arc<RecordingStatusReporter>,
}

impl Scenario {
    /// Creates a scenario whose project follows `policy`.
    #[must_use]
    pub fn with_policy(policy: ProjectPolicy) -> Self {
        let reporter = Arc::new(RecordingStatusReporter::new());
        let engine = TaskGraphEngine::new(
            EngineStores::in_memory(),
            Arc::new(StaticProjectPolicyProvider::with_project(
                ProjectId::new(PROJECT),
                policy,
            )),
            reporter.clone(),
            Arc::new(DefaultClock),
        );
        Self { engine, reporter }
    }

    /// Creates the version with its builds and tasks.
    ///
    /// # Errors
    ///
    /// Returns an error when the definition is rejected.
    pub async fn create(&self, definition: &VersionDefinition) -> eyre::Result<()> {
        self.engine.create_version(definition).await?;
        Ok(())
    }

    /// Reads a task back from the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup fails or the task is missing.
    pub async fn task(&self, id: &TaskId) -> eyre::Result<Task> {
        self.engine
            .stores()
            .tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| eyre!("task {id} not found"))
    }

    /// Reads a build back from the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup fails or the build is missing.
    pub async fn build(&self, id: &BuildId) -> eyre::Result<Build> {
        self.engine
            .stores()
            .builds
            .find_by_id(id)
            .await?
            .ok_or_else(|| eyre!("build {id} not found"))
    }

    /// Reads a version back from the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup fails or the version is missing.
    pub async fn version(&self, id: &VersionId) -> eyre::Result<Version> {
        self.engine
            .stores()
            .versions
            .find_by_id(id)
            .await?
            .ok_or_else(|| eyre!("version {id} not found"))
    }

    /// Starts a task and finishes it with `detail`.
    ///
    /// # Errors
    ///
    /// Returns an error when either transition is refused.
    pub async fn run(&self, id: &TaskId, detail: TaskEndDetail) -> eyre::Result<()> {
        self.engine.mark_start(id).await?;
        self.finish(id, detail).await
    }

    /// Finishes a task with `detail` on behalf of the agent API.
    ///
    /// # Errors
    ///
    /// Returns an error when the finish is refused.
    pub async fn finish(&self, id: &TaskId, detail: TaskEndDetail) -> eyre::Result<()> {
        self.engine
            .mark_end(MarkEndRequest::new(id.clone(), Activator::ApiServer, detail))
            .await?;
        Ok(())
    }
}

/// Provides a scenario with the default project policy.
#[fixture]
pub fn scenario() -> Scenario {
    Scenario::with_policy(ProjectPolicy::default())
}

/// A mainline version with a single variant holding `tasks`.
#[must_use]
pub fn mainline(version: &str, order: u64, tasks: Vec<TaskUnitDefinition>) -> VersionDefinition {
    let variant = tasks
        .into_iter()
        .fold(VariantDefinition::new(VARIANT), VariantDefinition::with_task);
    VersionDefinition::new(
        VersionId::new(version),
        ProjectId::new(PROJECT),
        Requester::Mainline,
        order,
    )
    .with_variant(variant)
}

/// Identifier of `task` in the single variant of `version`.
#[must_use]
pub fn task_id(version: &str, task: &str) -> TaskId {
    task_in(version, VARIANT, task)
}

/// Identifier of `task` in `variant` of `version`.
#[must_use]
pub fn task_in(version: &str, variant: &str, task: &str) -> TaskId {
    TaskId::new(format!("{version}_{variant}_{task}"))
}

/// Identifier of the build for `variant` of `version`.
#[must_use]
pub fn build_of(version: &str, variant: &str) -> BuildId {
    BuildId::for_variant(&VersionId::new(version), variant)
}
