//! Given steps for commit queue BDD scenarios.

use super::world::{CommitQueueWorld, VARIANT, project, run_async, task_of};
use buildgraph::commit_queue::domain::{CommitQueueItem, ItemSource};
use buildgraph::engine::MarkEndRequest;
use buildgraph::project::domain::{
    EdgeDefinition, TaskUnitDefinition, VariantDefinition, VersionDefinition,
};
use buildgraph::task::domain::{Activator, Requester, TaskEndDetail, VersionId};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("an empty commit queue")]
fn empty_commit_queue(world: &mut CommitQueueWorld) -> Result<(), eyre::Report> {
    let queue = run_async(world.engine.ensure_commit_queue(&project()))
        .wrap_err("create commit queue")?;
    eyre::ensure!(queue.is_empty(), "fresh queue already holds items");
    Ok(())
}

#[given(r#"merge-test version "{version}" is queued"#)]
fn merge_test_version_queued(
    world: &mut CommitQueueWorld,
    version: String,
) -> Result<(), eyre::Report> {
    world.queued_versions = world.queued_versions.saturating_add(1);
    let definition = VersionDefinition::new(
        VersionId::new(version.as_str()),
        project(),
        Requester::MergeTest,
        world.queued_versions,
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
    .activated();
    run_async(world.engine.create_version(&definition)).wrap_err("create merge-test version")?;

    let item = CommitQueueItem::new(version.as_str(), ItemSource::PullRequest)
        .with_patch(VersionId::new(version.as_str()));
    run_async(world.engine.enqueue(&project(), item)).wrap_err("enqueue merge-test version")?;
    Ok(())
}

#[given(r#"version "{version}" is processing"#)]
fn version_is_processing(world: &mut CommitQueueWorld, version: String) -> Result<(), eyre::Report> {
    run_async(world.engine.start_processing(
        &project(),
        &version,
        VersionId::new(version.as_str()),
    ))
    .wrap_err("start processing queue item")?;
    Ok(())
}

#[given(r#"the test task of version "{version}" has passed"#)]
fn test_task_passed(world: &mut CommitQueueWorld, version: String) -> Result<(), eyre::Report> {
    let test = task_of(&version, "test");
    run_async(world.engine.mark_start(&test)).wrap_err("start test task")?;
    run_async(world.engine.mark_end(MarkEndRequest::new(
        test,
        Activator::ApiServer,
        TaskEndDetail::succeeded(),
    )))
    .wrap_err("finish test task")?;
    Ok(())
}
