//! Integration tests for finishing tasks.

use super::helpers::{PROJECT, Scenario, VARIANT, build_of, scenario, task_id};
use buildgraph::project::domain::{TaskUnitDefinition, VariantDefinition, VersionDefinition};
use buildgraph::rollup::domain::{BuildStatus, VersionStatus};
use buildgraph::task::domain::{ProjectId, Requester, TaskEndDetail, TaskStatus, VersionId};
use rstest::rstest;

/// A pull request version whose single variant reports to GitHub.
fn checked_pull_request() -> VersionDefinition {
    VersionDefinition::new(
        VersionId::new("pr-7"),
        ProjectId::new(PROJECT),
        Requester::GithubPullRequest,
        7,
    )
    .with_variant(
        VariantDefinition::new(VARIANT)
            .in_github_check()
            .with_task(TaskUnitDefinition::new("compile"))
            .with_task(TaskUnitDefinition::new("lint")),
    )
    .activated()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finishing_twice_changes_nothing(scenario: Scenario) -> eyre::Result<()> {
    scenario.create(&checked_pull_request()).await?;
    let compile = task_id("pr-7", "compile");
    scenario
        .run(&task_id("pr-7", "lint"), TaskEndDetail::succeeded())
        .await?;
    scenario.run(&compile, TaskEndDetail::succeeded()).await?;

    let task = scenario.task(&compile).await?;
    let build = scenario.build(&build_of("pr-7", VARIANT)).await?;
    let reports = scenario.reporter.reports().len();
    eyre::ensure!(reports > 0, "a finished GitHub check build is reported");

    scenario.finish(&compile, TaskEndDetail::succeeded()).await?;

    assert_eq!(scenario.task(&compile).await?, task);
    assert_eq!(scenario.build(&build_of("pr-7", VARIANT)).await?, build);
    assert_eq!(build.status(), BuildStatus::Succeeded);
    let version = scenario
        .engine
        .stores()
        .versions
        .find_by_id(&VersionId::new("pr-7"))
        .await?
        .ok_or_else(|| eyre::eyre!("version not found"))?;
    assert_eq!(version.status(), VersionStatus::Succeeded);
    assert_eq!(scenario.reporter.reports().len(), reports);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finishing_an_unstarted_task_is_accepted(scenario: Scenario) -> eyre::Result<()> {
    scenario.create(&checked_pull_request()).await?;
    let compile = task_id("pr-7", "compile");

    scenario.finish(&compile, TaskEndDetail::failed()).await?;

    let task = scenario.task(&compile).await?;
    assert_eq!(task.status(), TaskStatus::Failed);
    assert!(task.start_time().is_none());
    Ok(())
}
