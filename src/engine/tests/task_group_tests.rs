//! Tests for single-host task group sequencing.

use super::support::{Harness, PROJECT, VARIANT, build_id, task_id};
use crate::engine::{EngineError, ResetRequest};
use crate::project::domain::{
    EdgeDefinition, ProjectPolicy, TaskUnitDefinition, VariantDefinition, VersionDefinition,
};
use crate::task::domain::{
    Activator, ProjectId, Requester, ResetOrigin, Task, TaskDefinition, TaskEndDetail,
    TaskStatus, VersionId,
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new(ProjectPolicy::default())
}

/// `setup`, `test` and `teardown` pinned to one host, in that order.
fn pinned_group(version: &str, order: u64, activate: bool) -> VersionDefinition {
    let variant = VariantDefinition::new(VARIANT)
        .with_task(TaskUnitDefinition::new("setup"))
        .with_task(TaskUnitDefinition::new("test").depending_on(EdgeDefinition::on("setup")))
        .with_task(TaskUnitDefinition::new("teardown"))
        .with_task_group("db", 1, ["setup", "test", "teardown"]);
    let definition = VersionDefinition::new(
        VersionId::new(version),
        ProjectId::new(PROJECT),
        Requester::Mainline,
        order,
    )
    .with_variant(variant);
    if activate {
        definition.activated()
    } else {
        definition
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn group_membership_follows_definition_order(harness: Harness) {
    harness.create(&pinned_group("v1", 1, true)).await;

    let members = harness
        .engine
        .stores()
        .tasks
        .find_task_group(&build_id("v1"), "db")
        .await
        .expect("group lookup");

    let names: Vec<&str> = members.iter().map(|task| task.display_name()).collect();
    assert_eq!(names, ["setup", "test", "teardown"]);
    assert!(
        members
            .iter()
            .all(Task::is_part_of_single_host_task_group)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reset_is_deferred_until_the_group_is_done(harness: Harness) {
    harness.create(&pinned_group("v1", 1, true)).await;
    let setup = task_id("v1", "setup");
    harness.run(&setup, TaskEndDetail::succeeded()).await;

    harness
        .engine
        .try_reset_task(ResetRequest::new(
            setup.clone(),
            Activator::user("alice"),
            ResetOrigin::Ui,
        ))
        .await
        .expect("reset is accepted");
    let flagged = harness.task(&setup).await;
    assert!(flagged.reset_when_finished());
    assert_eq!(flagged.execution(), 0);

    harness
        .run(&task_id("v1", "test"), TaskEndDetail::succeeded())
        .await;
    assert_eq!(harness.task(&setup).await.execution(), 0);

    harness
        .run(&task_id("v1", "teardown"), TaskEndDetail::succeeded())
        .await;

    for name in ["setup", "test", "teardown"] {
        let task = harness.task(&task_id("v1", name)).await;
        assert_eq!(task.execution(), 1, "{name} was reset with the group");
        assert_eq!(task.status(), TaskStatus::Undispatched);
        assert!(!task.reset_when_finished());
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blocked_members_do_not_hold_the_group_back(harness: Harness) {
    harness.create(&pinned_group("v1", 1, true)).await;
    let setup = task_id("v1", "setup");
    harness.run(&setup, TaskEndDetail::failed()).await;
    harness
        .run(&task_id("v1", "teardown"), TaskEndDetail::succeeded())
        .await;
    assert!(harness.task(&task_id("v1", "test")).await.blocked());

    harness
        .engine
        .try_reset_task(ResetRequest::new(
            setup.clone(),
            Activator::user("alice"),
            ResetOrigin::Ui,
        ))
        .await
        .expect("group resets");

    let test = harness.task(&task_id("v1", "test")).await;
    assert_eq!(test.execution(), 1);
    assert!(!test.blocked(), "the reset reopens the edge onto setup");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deactivating_a_member_deactivates_later_members(harness: Harness) {
    harness.create(&pinned_group("v1", 1, true)).await;

    harness
        .engine
        .set_active_state_by_id(&task_id("v1", "test"), &Activator::user("alice"), false)
        .await
        .expect("member deactivates");

    assert!(harness.task(&task_id("v1", "setup")).await.activated());
    assert!(!harness.task(&task_id("v1", "test")).await.activated());
    assert!(!harness.task(&task_id("v1", "teardown")).await.activated());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stepback_walks_the_group_up_to_the_failing_member() {
    let harness = Harness::new(ProjectPolicy::with_stepback(true));
    harness.create(&pinned_group("r1", 1, true)).await;
    for name in ["setup", "test", "teardown"] {
        harness
            .run(&task_id("r1", name), TaskEndDetail::succeeded())
            .await;
    }
    harness.create(&pinned_group("r2", 2, false)).await;
    harness.create(&pinned_group("r3", 3, true)).await;
    harness
        .run(&task_id("r3", "setup"), TaskEndDetail::succeeded())
        .await;

    harness
        .run(&task_id("r3", "test"), TaskEndDetail::failed())
        .await;

    assert!(harness.task(&task_id("r2", "setup")).await.activated());
    assert!(harness.task(&task_id("r2", "test")).await.activated());
    assert!(!harness.task(&task_id("r2", "teardown")).await.activated());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_group_is_reported(harness: Harness) {
    harness.create(&pinned_group("v1", 1, true)).await;
    let stored = harness.task(&task_id("v1", "setup")).await;
    let orphan = Task::new(
        TaskDefinition::new(
            stored.id().clone(),
            stored.display_name(),
            stored.build_variant(),
            stored.version_id().clone(),
            stored.project_id().clone(),
        )
        .in_task_group("missing", 1, 1),
        &DefaultClock,
    )
    .expect("valid task");

    let err = harness
        .engine
        .check_reset_single_host_task_group(&orphan, &Activator::System)
        .await
        .expect_err("group has no members");

    assert!(matches!(err, EngineError::EmptyTaskGroup { ref group, .. } if group == "missing"));
}
