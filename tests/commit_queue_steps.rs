//! Behaviour tests for commit queue ordering and merge-test failures.

#[path = "commit_queue_steps/mod.rs"]
mod commit_queue_steps_defs;

use commit_queue_steps_defs::world::{CommitQueueWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/commit_queue.feature",
    name = "Enqueueing the same issue twice"
)]
#[tokio::test(flavor = "multi_thread")]
async fn enqueue_same_issue_twice(world: CommitQueueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/commit_queue.feature",
    name = "Removing the head of the merge chain"
)]
#[tokio::test(flavor = "multi_thread")]
async fn remove_head_of_merge_chain(world: CommitQueueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/commit_queue.feature",
    name = "A failed merge test restarts the items behind it"
)]
#[tokio::test(flavor = "multi_thread")]
async fn failed_merge_test_restarts_later_items(world: CommitQueueWorld) {
    let _ = world;
}
