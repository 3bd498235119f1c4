//! Integration tests for commit queue ordering and the merge chain.

use super::helpers::{PROJECT, Scenario, VARIANT, scenario, task_id};
use buildgraph::commit_queue::domain::{CommitQueueItem, ItemSource};
use buildgraph::engine::EngineError;
use buildgraph::project::domain::{
    EdgeDefinition, TaskUnitDefinition, VariantDefinition, VersionDefinition,
};
use buildgraph::task::domain::{Activator, ProjectId, Requester, VersionId};
use rstest::rstest;

fn project() -> ProjectId {
    ProjectId::new(PROJECT)
}

fn pull_request(issue: &str) -> CommitQueueItem {
    CommitQueueItem::new(issue, ItemSource::PullRequest).with_patch(VersionId::new(issue))
}

fn merge_version(issue: &str, order: u64) -> VersionDefinition {
    VersionDefinition::new(
        VersionId::new(issue),
        project(),
        Requester::MergeTest,
        order,
    )
    .with_variant(
        VariantDefinition::new(VARIANT)
            .with_task(TaskUnitDefinition::new("test"))
            .with_task(
                TaskUnitDefinition::new("merge")
                    .as_commit_queue_merge()
                    .depending_on(EdgeDefinition::on("test")),
            ),
    )
    .activated()
}

async fn queue_issues(scenario: &Scenario) -> eyre::Result<Vec<String>> {
    let queue = scenario.engine.ensure_commit_queue(&project()).await?;
    Ok(queue
        .items()
        .iter()
        .map(|item| item.issue().to_owned())
        .collect())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_issue_is_refused_at_its_position(scenario: Scenario) -> eyre::Result<()> {
    let first = scenario
        .engine
        .enqueue(&project(), CommitQueueItem::new("123", ItemSource::PullRequest))
        .await?;
    assert_eq!(first, 0);

    let err = scenario
        .engine
        .enqueue(&project(), CommitQueueItem::new("123", ItemSource::PullRequest))
        .await
        .expect_err("duplicate enqueue is refused");

    match err {
        EngineError::CommitQueueDomain(domain) => {
            assert_eq!(domain.existing_position(), Some(0));
            assert_eq!(domain.to_string(), "item already in queue");
        }
        other => return Err(eyre::eyre!("unexpected error: {other}")),
    }
    assert_eq!(queue_issues(&scenario).await?, ["123"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_the_head_makes_the_next_item_the_head(scenario: Scenario) -> eyre::Result<()> {
    for (order, issue) in [(1_u64, "a"), (2, "b"), (3, "c")] {
        scenario.create(&merge_version(issue, order)).await?;
        scenario.engine.enqueue(&project(), pull_request(issue)).await?;
    }
    for issue in ["a", "b"] {
        scenario
            .engine
            .start_processing(&project(), issue, VersionId::new(issue))
            .await?;
    }
    let merge_a = task_id("a", "merge");
    eyre::ensure!(
        scenario
            .task(&task_id("b", "merge"))
            .await?
            .dependency_on(&merge_a)
            .is_some(),
        "b merges after a"
    );

    let queue = scenario.engine.ensure_commit_queue(&project()).await?;
    scenario
        .engine
        .remove_next_merge_task_dependency(&queue, "a")
        .await?;
    scenario
        .engine
        .remove_item_and_prevent_merge(&project(), "a", &Activator::user("sam"))
        .await?;

    let merge_b = scenario.task(&task_id("b", "merge")).await?;
    assert!(merge_b.dependency_on(&merge_a).is_none());
    assert_eq!(merge_b.depends_on().len(), 1, "only its own test remains");
    assert_eq!(queue_issues(&scenario).await?, ["b", "c"]);
    let merge_c = scenario.task(&task_id("c", "merge")).await?;
    assert_eq!(merge_c.depends_on().len(), 1, "c was never chained");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_before_an_unprocessed_item_needs_no_relink(
    scenario: Scenario,
) -> eyre::Result<()> {
    for (order, issue) in [(1_u64, "a"), (2, "b"), (3, "c")] {
        scenario.create(&merge_version(issue, order)).await?;
        scenario.engine.enqueue(&project(), pull_request(issue)).await?;
    }
    for issue in ["a", "b"] {
        scenario
            .engine
            .start_processing(&project(), issue, VersionId::new(issue))
            .await?;
    }
    let merge_c_before = scenario.task(&task_id("c", "merge")).await?;

    let queue = scenario.engine.ensure_commit_queue(&project()).await?;
    scenario
        .engine
        .remove_next_merge_task_dependency(&queue, "b")
        .await?;
    scenario
        .engine
        .remove_item_and_prevent_merge(&project(), "b", &Activator::user("sam"))
        .await?;

    assert_eq!(queue_issues(&scenario).await?, ["a", "c"]);
    assert_eq!(scenario.task(&task_id("c", "merge")).await?, merge_c_before);
    Ok(())
}
