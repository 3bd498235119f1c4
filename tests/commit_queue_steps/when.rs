//! When steps for commit queue BDD scenarios.

use super::world::{CommitQueueWorld, project, run_async, task_of};
use buildgraph::commit_queue::domain::{CommitQueueItem, ItemSource};
use buildgraph::engine::MarkEndRequest;
use buildgraph::task::domain::{Activator, TaskEndDetail};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"issue "{issue}" is enqueued"#)]
fn issue_enqueued(world: &mut CommitQueueWorld, issue: String) {
    let item = CommitQueueItem::new(issue, ItemSource::PullRequest);
    world.last_enqueue = Some(run_async(world.engine.enqueue(&project(), item)));
}

#[when(r#"item "{issue}" is removed from the queue"#)]
fn item_removed(world: &mut CommitQueueWorld, issue: String) -> Result<(), eyre::Report> {
    let queue = run_async(world.engine.ensure_commit_queue(&project()))
        .wrap_err("load commit queue")?;
    run_async(world.engine.remove_next_merge_task_dependency(&queue, &issue))
        .wrap_err("unlink merge task")?;
    let removed = run_async(world.engine.remove_item_and_prevent_merge(
        &project(),
        &issue,
        &Activator::user("release-manager"),
    ))
    .wrap_err("remove queue item")?;
    eyre::ensure!(removed.is_some(), "item {issue} was not queued");
    Ok(())
}

#[when(r#"the test task of version "{version}" fails"#)]
fn test_task_fails(world: &mut CommitQueueWorld, version: String) -> Result<(), eyre::Report> {
    let test = task_of(&version, "test");
    run_async(world.engine.mark_start(&test)).wrap_err("start test task")?;
    run_async(world.engine.mark_end(MarkEndRequest::new(
        test,
        Activator::ApiServer,
        TaskEndDetail::failed(),
    )))
    .wrap_err("fail test task")?;
    Ok(())
}
