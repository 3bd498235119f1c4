//! Shared world state for commit queue BDD scenarios.

use std::sync::Arc;

use buildgraph::engine::{EngineError, EngineStores, TaskGraphEngine};
use buildgraph::project::adapters::memory::StaticProjectPolicyProvider;
use buildgraph::project::domain::ProjectPolicy;
use buildgraph::reporting::adapters::memory::RecordingStatusReporter;
use buildgraph::task::domain::{ProjectId, TaskId};
use mockable::DefaultClock;
use rstest::fixture;

/// Engine type used by the BDD world.
pub type TestEngine = TaskGraphEngine<DefaultClock>;

/// Project the scenarios queue into.
pub const PROJECT: &str = "gateway";

/// Variant every merge-test version builds.
pub const VARIANT: &str = "commit-queue";

/// Scenario world for commit queue behaviour tests.
pub struct CommitQueueWorld {
    pub engine: TestEngine,
    pub queued_versions: u64,
    pub last_enqueue: Option<Result<usize, EngineError>>,
}

impl CommitQueueWorld {
    /// Creates a world over empty in-memory stores.
    #[must_use]
    pub fn new() -> Self {
        let engine = TaskGraphEngine::new(
            EngineStores::in_memory(),
            Arc::new(StaticProjectPolicyProvider::with_project(
                project(),
                ProjectPolicy::default(),
            )),
            Arc::new(RecordingStatusReporter::new()),
            Arc::new(DefaultClock),
        );

        Self {
            engine,
            queued_versions: 0,
            last_enqueue: None,
        }
    }
}

impl Default for CommitQueueWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> CommitQueueWorld {
    CommitQueueWorld::default()
}

/// The scenario project.
#[must_use]
pub fn project() -> ProjectId {
    ProjectId::new(PROJECT)
}

/// Identifier of `task` in merge-test version `version`.
#[must_use]
pub fn task_of(version: &str, task: &str) -> TaskId {
    TaskId::new(format!("{version}_{VARIANT}_{task}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
