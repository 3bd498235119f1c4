//! Integration tests for blocked dependency propagation across builds.

use super::helpers::{PROJECT, Scenario, VARIANT, build_of, mainline, scenario, task_id, task_in};
use buildgraph::engine::ResetRequest;
use buildgraph::project::domain::{
    EdgeDefinition, TaskUnitDefinition, VariantDefinition, VersionDefinition,
};
use buildgraph::rollup::domain::{BuildStatus, VersionStatus};
use buildgraph::task::domain::{
    Activator, ProjectId, Requester, ResetOrigin, TaskEndDetail, TaskStatus, VersionId,
};
use rstest::rstest;

const PACKAGING: &str = "packaging";

/// `compile` on the main variant, with `bundle` (and optionally `docs`) on
/// a packaging variant waiting for it to succeed.
fn cross_variant(with_docs: bool) -> VersionDefinition {
    let mut packaging = VariantDefinition::new(PACKAGING).with_task(
        TaskUnitDefinition::new("bundle")
            .depending_on(EdgeDefinition::on("compile").in_variant(VARIANT)),
    );
    if with_docs {
        packaging = packaging.with_task(TaskUnitDefinition::new("docs"));
    }
    VersionDefinition::new(
        VersionId::new("v1"),
        ProjectId::new(PROJECT),
        Requester::Mainline,
        1,
    )
    .with_variant(VariantDefinition::new(VARIANT).with_task(TaskUnitDefinition::new("compile")))
    .with_variant(packaging)
    .activated()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_dependency_in_another_build_blocks_the_only_task(
    scenario: Scenario,
) -> eyre::Result<()> {
    scenario.create(&cross_variant(false)).await?;

    scenario
        .run(&task_id("v1", "compile"), TaskEndDetail::failed())
        .await?;

    let bundle = scenario.task(&task_in("v1", PACKAGING, "bundle")).await?;
    let edge = bundle
        .dependency_on(&task_id("v1", "compile"))
        .ok_or_else(|| eyre::eyre!("bundle lost its edge"))?;
    assert!(edge.unattainable);
    assert_eq!(bundle.status(), TaskStatus::Undispatched);

    let build = scenario.build(&build_of("v1", PACKAGING)).await?;
    assert_eq!(build.status(), BuildStatus::Created);
    assert!(build.all_tasks_blocked());
    let version = scenario.version(&VersionId::new("v1")).await?;
    assert_eq!(version.status(), VersionStatus::Failed, "nothing is left to run");

    scenario
        .engine
        .try_reset_task(ResetRequest::new(
            task_id("v1", "compile"),
            Activator::user("sam"),
            ResetOrigin::Ui,
        ))
        .await?;

    let reopened = scenario.build(&build_of("v1", PACKAGING)).await?;
    assert!(!reopened.all_tasks_blocked());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_dependency_leaves_a_build_with_other_work_alone(
    scenario: Scenario,
) -> eyre::Result<()> {
    scenario.create(&cross_variant(true)).await?;
    let docs = task_in("v1", PACKAGING, "docs");
    scenario.engine.mark_start(&docs).await?;

    scenario
        .run(&task_id("v1", "compile"), TaskEndDetail::failed())
        .await?;

    assert!(scenario.task(&task_in("v1", PACKAGING, "bundle")).await?.blocked());
    let build = scenario.build(&build_of("v1", PACKAGING)).await?;
    assert_eq!(build.status(), BuildStatus::Started);
    assert!(!build.all_tasks_blocked());
    let version = scenario.version(&VersionId::new("v1")).await?;
    assert_eq!(version.status(), VersionStatus::Started);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blocking_is_transitive_and_reset_undoes_it(scenario: Scenario) -> eyre::Result<()> {
    scenario
        .create(
            &mainline(
                "v1",
                1,
                vec![
                    TaskUnitDefinition::new("a"),
                    TaskUnitDefinition::new("b").depending_on(EdgeDefinition::on("a")),
                    TaskUnitDefinition::new("c").depending_on(EdgeDefinition::on("b")),
                ],
            )
            .activated(),
        )
        .await?;
    let a = task_id("v1", "a");

    scenario.run(&a, TaskEndDetail::failed()).await?;
    for name in ["b", "c"] {
        assert!(scenario.task(&task_id("v1", name)).await?.blocked(), "{name} is blocked");
    }

    scenario
        .engine
        .try_reset_task(ResetRequest::new(a.clone(), Activator::user("sam"), ResetOrigin::Ui))
        .await?;

    for name in ["b", "c"] {
        let task = scenario.task(&task_id("v1", name)).await?;
        assert!(!task.blocked(), "{name} is unblocked");
        assert_eq!(task.status(), TaskStatus::Undispatched);
    }
    assert_eq!(scenario.task(&a).await?.execution(), 1);
    Ok(())
}
