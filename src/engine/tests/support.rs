//! Shared fixtures for engine tests.

use crate::config::EngineConfig;
use crate::engine::{EngineStores, MarkEndRequest, TaskGraphEngine};
use crate::project::adapters::memory::StaticProjectPolicyProvider;
use crate::project::domain::{ProjectPolicy, TaskUnitDefinition, VariantDefinition, VersionDefinition};
use crate::project::ports::ProjectPolicyProvider;
use crate::reporting::adapters::memory::RecordingStatusReporter;
use crate::reporting::ports::StatusReporter;
use crate::rollup::domain::{Build, Version};
use crate::task::domain::{
    Activator, BuildId, ProjectId, Requester, Task, TaskEndDetail, TaskId, VersionId,
};
use mockable::DefaultClock;
use std::sync::Arc;

pub const PROJECT: &str = "proj";
pub const VARIANT: &str = "linux";

pub type TestEngine = TaskGraphEngine<DefaultClock>;

/// An engine over in-memory stores with a recording reporter.
pub struct Harness {
    pub engine: TestEngine,
    pub reporter: Arc<RecordingStatusReporter>,
}

impl Harness {
    pub fn new(policy: ProjectPolicy) -> Self {
        Self::with_config(policy, EngineConfig::default())
    }

    pub fn with_config(policy: ProjectPolicy, config: EngineConfig) -> Self {
        let reporter = Arc::new(RecordingStatusReporter::new());
        let policies = Arc::new(StaticProjectPolicyProvider::with_project(
            ProjectId::new(PROJECT),
            policy,
        ));
        let engine = engine_with(policies, reporter.clone()).with_config(config);
        Self { engine, reporter }
    }

    pub async fn create(&self, definition: &VersionDefinition) -> Version {
        self.engine
            .create_version(definition)
            .await
            .expect("version is created")
    }

    pub async fn task(&self, id: &TaskId) -> Task {
        self.engine
            .stores()
            .tasks
            .find_by_id(id)
            .await
            .expect("task lookup")
            .expect("task exists")
    }

    pub async fn build(&self, id: &BuildId) -> Build {
        self.engine
            .stores()
            .builds
            .find_by_id(id)
            .await
            .expect("build lookup")
            .expect("build exists")
    }

    pub async fn version(&self, id: &VersionId) -> Version {
        self.engine
            .stores()
            .versions
            .find_by_id(id)
            .await
            .expect("version lookup")
            .expect("version exists")
    }

    /// Starts the task and reports `detail` for it.
    pub async fn run(&self, id: &TaskId, detail: TaskEndDetail) {
        self.engine.mark_start(id).await.expect("task starts");
        self.finish(id, detail).await;
    }

    pub async fn finish(&self, id: &TaskId, detail: TaskEndDetail) {
        self.engine
            .mark_end(MarkEndRequest::new(id.clone(), Activator::ApiServer, detail))
            .await
            .expect("task finishes");
    }
}

pub fn engine_with(
    policies: Arc<dyn ProjectPolicyProvider>,
    reporter: Arc<dyn StatusReporter>,
) -> TestEngine {
    TaskGraphEngine::new(
        EngineStores::in_memory(),
        policies,
        reporter,
        Arc::new(DefaultClock),
    )
}

/// A mainline version with one variant holding `tasks`.
pub fn mainline(version: &str, order: u64, tasks: Vec<TaskUnitDefinition>) -> VersionDefinition {
    with_tasks(
        VersionDefinition::new(
            VersionId::new(version),
            ProjectId::new(PROJECT),
            Requester::Mainline,
            order,
        ),
        tasks,
    )
}

pub fn with_tasks(definition: VersionDefinition, tasks: Vec<TaskUnitDefinition>) -> VersionDefinition {
    let variant = tasks
        .into_iter()
        .fold(VariantDefinition::new(VARIANT), VariantDefinition::with_task);
    definition.with_variant(variant)
}

pub fn task_id(version: &str, task: &str) -> TaskId {
    TaskId::new(format!("{version}_{VARIANT}_{task}"))
}

pub fn build_id(version: &str) -> BuildId {
    BuildId::for_variant(&VersionId::new(version), VARIANT)
}
