//! Then steps for commit queue BDD scenarios.

use super::world::{CommitQueueWorld, project, run_async, task_of};
use buildgraph::engine::EngineError;
use buildgraph::task::domain::{RequiredStatus, Task};
use eyre::WrapErr;
use rstest_bdd_macros::then;

fn merge_task(world: &CommitQueueWorld, version: &str) -> Result<Task, eyre::Report> {
    find_task(world, version, "merge")
}

fn find_task(world: &CommitQueueWorld, version: &str, name: &str) -> Result<Task, eyre::Report> {
    let id = task_of(version, name);
    run_async(world.engine.stores().tasks.find_by_id(&id))
        .wrap_err("look up task")?
        .ok_or_else(|| eyre::eyre!("task {id} not found"))
}

#[then("the enqueue returns position {position:usize}")]
fn enqueue_returns_position(world: &CommitQueueWorld, position: usize) -> Result<(), eyre::Report> {
    match world.last_enqueue.as_ref() {
        Some(Ok(actual)) if *actual == position => Ok(()),
        other => Err(eyre::eyre!("expected position {position}, got {other:?}")),
    }
}

#[then(r#"the enqueue is refused at position {position:usize} with "{message}""#)]
fn enqueue_refused(
    world: &CommitQueueWorld,
    position: usize,
    message: String,
) -> Result<(), eyre::Report> {
    let Some(Err(EngineError::CommitQueueDomain(err))) = world.last_enqueue.as_ref() else {
        return Err(eyre::eyre!(
            "expected a refused enqueue, got {:?}",
            world.last_enqueue
        ));
    };
    eyre::ensure!(
        err.existing_position() == Some(position),
        "expected existing position {position}, got {:?}",
        err.existing_position()
    );
    eyre::ensure!(err.to_string() == message, "unexpected message: {err}");
    Ok(())
}

#[then(r#"the queue holds "{issues}""#)]
fn queue_holds(world: &CommitQueueWorld, issues: String) -> Result<(), eyre::Report> {
    let queue = run_async(world.engine.ensure_commit_queue(&project()))
        .wrap_err("load commit queue")?;
    let actual: Vec<&str> = queue.items().iter().map(|item| item.issue()).collect();
    let expected: Vec<&str> = issues.split(',').map(str::trim).collect();
    eyre::ensure!(actual == expected, "expected queue {expected:?}, got {actual:?}");
    Ok(())
}

#[then(r#"the merge task of version "{version}" waits for no other merge"#)]
fn merge_waits_for_no_merge(world: &CommitQueueWorld, version: String) -> Result<(), eyre::Report> {
    let merge = merge_task(world, &version)?;
    let test = task_of(&version, "test");
    eyre::ensure!(
        merge.depends_on().iter().all(|edge| edge.task_id == test),
        "merge of {version} still waits for {:?}",
        merge.depends_on()
    );
    Ok(())
}

#[then(r#"the merge task of version "{version}" waits for the merge of version "{ahead}""#)]
fn merge_waits_for_merge(
    world: &CommitQueueWorld,
    version: String,
    ahead: String,
) -> Result<(), eyre::Report> {
    let merge = merge_task(world, &version)?;
    let edge = merge
        .dependency_on(&task_of(&ahead, "merge"))
        .ok_or_else(|| eyre::eyre!("merge of {version} does not wait for {ahead}"))?;
    eyre::ensure!(
        edge.status == RequiredStatus::Any && !edge.unattainable,
        "unexpected edge onto {ahead}: {edge:?}"
    );
    eyre::ensure!(!merge.blocked(), "merge of {version} is blocked");
    Ok(())
}

#[then(r#"the merge task of version "{version}" is disabled"#)]
fn merge_is_disabled(world: &CommitQueueWorld, version: String) -> Result<(), eyre::Report> {
    let merge = merge_task(world, &version)?;
    eyre::ensure!(
        merge.priority() < 0 && !merge.activated(),
        "merge of {version} can still run"
    );
    Ok(())
}

#[then(r#"the test task of version "{version}" is on execution {execution:u32}"#)]
fn test_task_execution(
    world: &CommitQueueWorld,
    version: String,
    execution: u32,
) -> Result<(), eyre::Report> {
    let test = find_task(world, &version, "test")?;
    eyre::ensure!(
        test.execution() == execution,
        "expected execution {execution}, got {}",
        test.execution()
    );
    Ok(())
}
