//! Tests for resets, the execution cap and display tasks.

use super::support::{Harness, PROJECT, VARIANT, mainline, task_id};
use crate::config::EngineConfig;
use crate::engine::{EngineError, ResetRequest};
use crate::project::domain::{
    ProjectPolicy, TaskUnitDefinition, VariantDefinition, VersionDefinition,
};
use crate::task::domain::{
    Activator, EXECUTION_CAP_DESCRIPTION, ProjectId, Requester, ResetOrigin, TaskEndDetail,
    TaskId, TaskStatus, VersionId,
};
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new(ProjectPolicy::default())
}

fn reset_request(id: &TaskId, origin: ResetOrigin) -> ResetRequest {
    ResetRequest::new(id.clone(), Activator::user("alice"), origin)
}

async fn single_task(harness: &Harness) -> TaskId {
    harness
        .create(&mainline("v1", 1, vec![TaskUnitDefinition::new("compile")]).activated())
        .await;
    task_id("v1", "compile")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interactive_reset_of_running_task_is_refused(harness: Harness) {
    let id = single_task(&harness).await;
    harness.engine.mark_start(&id).await.expect("task starts");

    let err = harness
        .engine
        .try_reset_task(reset_request(&id, ResetOrigin::Rest))
        .await
        .expect_err("running task cannot be reset from the API");

    assert!(matches!(err, EngineError::NotResettable { .. }));
    assert_eq!(harness.task(&id).await.execution(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reset_archives_and_starts_a_new_execution(harness: Harness) {
    let id = single_task(&harness).await;
    harness.run(&id, TaskEndDetail::failed()).await;

    harness
        .engine
        .try_reset_task(reset_request(&id, ResetOrigin::Ui))
        .await
        .expect("finished task resets");

    let task = harness.task(&id).await;
    assert_eq!(task.execution(), 1);
    assert_eq!(task.status(), TaskStatus::Undispatched);
    assert!(task.details().is_none());
    let archived = harness
        .engine
        .stores()
        .tasks
        .find_archived(&id)
        .await
        .expect("archive lookup");
    assert_eq!(archived.len(), 1);
    assert!(
        archived
            .first()
            .is_some_and(|old| old.status() == TaskStatus::Failed)
    );
}

#[rstest]
#[case(ResetOrigin::System, 1)]
#[case(ResetOrigin::Monitor, 1)]
#[case(ResetOrigin::Ui, 2)]
#[case(ResetOrigin::Rest, 2)]
#[tokio::test(flavor = "multi_thread")]
async fn only_interactive_origins_pass_the_execution_cap(
    #[case] origin: ResetOrigin,
    #[case] expected_execution: u32,
) {
    let harness = Harness::with_config(
        ProjectPolicy::default(),
        EngineConfig::default().with_max_task_execution(1),
    );
    let id = single_task(&harness).await;
    harness.run(&id, TaskEndDetail::failed()).await;
    harness
        .engine
        .try_reset_task(reset_request(&id, ResetOrigin::Ui))
        .await
        .expect("first reset");
    harness.run(&id, TaskEndDetail::failed()).await;

    harness
        .engine
        .try_reset_task(reset_request(&id, origin))
        .await
        .expect("reset request is accepted");

    assert_eq!(harness.task(&id).await.execution(), expected_execution);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn automated_reset_at_the_cap_fails_a_running_task() {
    let harness = Harness::with_config(
        ProjectPolicy::default(),
        EngineConfig::default().with_max_task_execution(1),
    );
    let id = single_task(&harness).await;
    harness.run(&id, TaskEndDetail::failed()).await;
    harness
        .engine
        .try_reset_task(reset_request(&id, ResetOrigin::Ui))
        .await
        .expect("first reset");
    harness.engine.mark_start(&id).await.expect("task starts");

    harness
        .engine
        .try_reset_task(reset_request(&id, ResetOrigin::Monitor))
        .await
        .expect("capped reset fails the task");

    let task = harness.task(&id).await;
    assert_eq!(task.execution(), 1);
    assert_eq!(task.status(), TaskStatus::SystemFailed);
    assert_eq!(
        task.details().and_then(TaskEndDetail::description),
        Some(EXECUTION_CAP_DESCRIPTION)
    );
}

async fn display_suite(harness: &Harness) {
    let variant = VariantDefinition::new(VARIANT)
        .with_task(TaskUnitDefinition::new("unit"))
        .with_task(TaskUnitDefinition::new("integration"))
        .with_display_task("suite", ["unit", "integration"]);
    harness
        .create(
            &VersionDefinition::new(
                VersionId::new("v1"),
                ProjectId::new(PROJECT),
                Requester::Mainline,
                1,
            )
            .with_variant(variant)
            .activated(),
        )
        .await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execution_tasks_cannot_be_reset_directly(harness: Harness) {
    display_suite(&harness).await;
    let unit = task_id("v1", "unit");
    harness.run(&unit, TaskEndDetail::succeeded()).await;

    let err = harness
        .engine
        .try_reset_task(reset_request(&unit, ResetOrigin::Ui))
        .await
        .expect_err("execution task reset is refused");

    assert!(matches!(err, EngineError::ExecutionTaskOfDisplay(ref id) if *id == unit));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn display_task_borrows_the_worst_execution_status(harness: Harness) {
    display_suite(&harness).await;

    harness
        .run(&task_id("v1", "unit"), TaskEndDetail::succeeded())
        .await;
    let partial = harness.task(&task_id("v1", "suite")).await;
    assert_eq!(partial.status(), TaskStatus::Started);

    harness
        .run(&task_id("v1", "integration"), TaskEndDetail::failed())
        .await;
    let finished = harness.task(&task_id("v1", "suite")).await;
    assert_eq!(finished.status(), TaskStatus::Failed);
    assert!(finished.finish_time().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn display_reset_waits_for_every_execution_task(harness: Harness) {
    display_suite(&harness).await;
    let unit = task_id("v1", "unit");
    let integration = task_id("v1", "integration");
    let suite = task_id("v1", "suite");
    harness.run(&unit, TaskEndDetail::succeeded()).await;

    let unit_task = harness.task(&unit).await;
    harness
        .engine
        .reset_task_or_display_task(&unit_task, &Activator::user("alice"), ResetOrigin::Ui, None)
        .await
        .expect("reset is deferred");
    let waiting = harness.task(&suite).await;
    assert!(waiting.reset_when_finished());
    assert_eq!(waiting.execution(), 0);

    harness.run(&integration, TaskEndDetail::failed()).await;

    for id in [&unit, &integration, &suite] {
        let task = harness.task(id).await;
        assert_eq!(task.execution(), 1, "{id} was reset");
        assert_eq!(task.status(), TaskStatus::Undispatched);
    }
}
