//! Commit queue processing and failure handling.
//!
//! Processing items of a project's commit queue are chained through their
//! merge tasks: each merge task depends on the merge task of the item ahead
//! of it, so merges land in queue order. When a merge test fails, every
//! later processing item is restarted (it was tested on top of a change
//! that will not land), the failing item is unlinked from the chain and
//! removed, and the rest of its patch is cancelled.

use crate::commit_queue::domain::{CommitQueue, CommitQueueItem};
use crate::engine::{EngineError, EngineResult, ResetRequest, TaskGraphEngine};
use crate::reporting::domain::{ExternalStatus, StatusReport};
use crate::task::domain::{
    AbortInfo, Activator, BuildId, Dependency, ProjectId, RequiredStatus, ResetOrigin, Task,
    TaskStatus, VersionId,
};
use futures::future::BoxFuture;
use mockable::Clock;
use std::collections::BTreeSet;
use tracing::{debug, error, info};

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Returns the project's commit queue, creating an empty one on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn ensure_commit_queue(&self, project_id: &ProjectId) -> EngineResult<CommitQueue> {
        if let Some(queue) = self.stores.commit_queues.find_by_project(project_id).await? {
            return Ok(queue);
        }
        let queue = CommitQueue::new(project_id.clone());
        self.stores.commit_queues.store(&queue).await?;
        info!(project_id = %project_id, "created commit queue");
        Ok(queue)
    }

    /// Appends an item to the project's queue and returns its position.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CommitQueueDomain`] when the item is already
    /// queued, or a store error.
    pub async fn enqueue(
        &self,
        project_id: &ProjectId,
        item: CommitQueueItem,
    ) -> EngineResult<usize> {
        let mut queue = self.ensure_commit_queue(project_id).await?;
        let issue = item.issue().to_owned();
        let position = queue.enqueue(item, &*self.clock)?;
        self.stores.commit_queues.update(&queue).await?;
        info!(project_id = %project_id, issue = %issue, position, "enqueued commit queue item");
        Ok(position)
    }

    /// Inserts an item right behind the processing items and returns its
    /// position.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CommitQueueDomain`] when the item is already
    /// queued, or a store error.
    pub async fn enqueue_at_front(
        &self,
        project_id: &ProjectId,
        item: CommitQueueItem,
    ) -> EngineResult<usize> {
        let mut queue = self.ensure_commit_queue(project_id).await?;
        let issue = item.issue().to_owned();
        let position = queue.enqueue_at_front(item, &*self.clock)?;
        self.stores.commit_queues.update(&queue).await?;
        info!(
            project_id = %project_id,
            issue = %issue,
            position,
            "enqueued commit queue item at front"
        );
        Ok(position)
    }

    /// Starts processing an item with the given merge-test version.
    ///
    /// The version's merge task is made to depend on the merge task of the
    /// processing item ahead of it. The edge starts out with that task's
    /// current state, so a chain onto an already finished merge is settled
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CommitQueueDomain`] when an earlier item is not
    /// processing yet, [`EngineError::MergeTaskNotFound`] when a merge task
    /// is missing, or a store error.
    pub async fn start_processing(
        &self,
        project_id: &ProjectId,
        issue: &str,
        version_id: VersionId,
    ) -> EngineResult<()> {
        let mut queue = self.fetch_commit_queue(project_id).await?;
        queue.update_version(issue, version_id.clone(), &*self.clock)?;
        self.stores.commit_queues.update(&queue).await?;

        let position = queue
            .find_item(issue)
            .ok_or_else(|| EngineError::CommitQueueItemNotFound(issue.to_owned()))?;
        let Some(previous_version) = position
            .checked_sub(1)
            .and_then(|before| queue.items().get(before))
            .and_then(CommitQueueItem::version)
        else {
            info!(project_id = %project_id, issue = %issue, "started processing queue head");
            return Ok(());
        };

        let previous_merge = self.fetch_merge_task(previous_version).await?;
        let mut merge = self.fetch_merge_task(&version_id).await?;
        let mut edge = Dependency::on_success(previous_merge.id().clone());
        edge.finished = previous_merge.is_finished();
        edge.unattainable = previous_merge.blocked()
            || (previous_merge.is_finished() && previous_merge.status() != TaskStatus::Succeeded);
        merge.add_dependency(edge)?;
        self.stores.tasks.update(&merge).await?;
        info!(
            project_id = %project_id,
            issue = %issue,
            merge_task_id = %merge.id(),
            depends_on = %previous_merge.id(),
            "started processing commit queue item"
        );
        Ok(())
    }

    /// Unlinks an item's merge task from the merge chain.
    ///
    /// The next item's merge task stops depending on this one and depends on
    /// the previous item's merge task instead, with any finished status
    /// accepted. Nothing changes when the next item is not processing.
    ///
    /// A merge task blocked only by the removed item is open again, and so
    /// is every merge further down the chain that was blocked through it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CommitQueueItemNotFound`] when the issue is not
    /// queued, [`EngineError::MergeTaskNotFound`] when a merge task is
    /// missing, or a store error.
    pub async fn remove_next_merge_task_dependency(
        &self,
        queue: &CommitQueue,
        issue: &str,
    ) -> EngineResult<()> {
        let position = queue
            .find_item(issue)
            .ok_or_else(|| EngineError::CommitQueueItemNotFound(issue.to_owned()))?;
        let items = queue.items();
        let Some(next_version) = items
            .get(position.saturating_add(1))
            .and_then(CommitQueueItem::version)
        else {
            return Ok(());
        };
        let current_version = items
            .get(position)
            .and_then(CommitQueueItem::version)
            .ok_or_else(|| EngineError::CommitQueueItemNotFound(issue.to_owned()))?;

        let mut next_merge = self.fetch_merge_task(next_version).await?;
        let current_merge = self.fetch_merge_task(current_version).await?;
        next_merge.remove_dependency(current_merge.id())?;

        if let Some(previous_version) = position
            .checked_sub(1)
            .and_then(|before| items.get(before))
            .and_then(CommitQueueItem::version)
        {
            let previous_merge = self.fetch_merge_task(previous_version).await?;
            let mut edge = Dependency::new(previous_merge.id().clone(), RequiredStatus::Any);
            edge.finished = previous_merge.is_finished();
            next_merge.add_dependency(edge)?;
        }
        self.stores.tasks.update(&next_merge).await?;
        debug!(
            issue = %issue,
            next_merge_task_id = %next_merge.id(),
            "removed merge task from the merge chain"
        );

        if next_merge.blocked() {
            return Ok(());
        }
        let mut builds = self.update_unblocked_dependencies(&next_merge).await?;
        builds.insert(next_merge.build_id().clone());
        let build_ids: Vec<BuildId> = builds.into_iter().collect();
        self.update_version_and_patch_status_for_builds(&build_ids)
            .await
    }

    /// Restarts every processing item queued behind `version_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CommitQueueNotFound`] when the project has no
    /// queue, or the first restart failure.
    pub async fn restart_items_after_version(
        &self,
        project_id: &ProjectId,
        version_id: &VersionId,
        caller: &Activator,
    ) -> EngineResult<()> {
        let queue = self.fetch_commit_queue(project_id).await?;
        self.restart_items_in_queue_after(&queue, version_id, caller)
            .await
    }

    async fn restart_items_in_queue_after(
        &self,
        queue: &CommitQueue,
        version_id: &VersionId,
        caller: &Activator,
    ) -> EngineResult<()> {
        let mut found = false;
        for item in queue.items() {
            let Some(version) = item.version() else {
                break;
            };
            if version == version_id {
                found = true;
            } else if found {
                info!(
                    failing_version = %version_id,
                    restarting_version = %version,
                    project_id = %queue.project_id(),
                    caller = %caller,
                    "restarting items due to commit queue failure"
                );
                self.restart_version(version).await?;
            }
        }
        Ok(())
    }

    /// Restarts every top-level task of a version. Running tasks are
    /// aborted and reset once they finish; finished tasks reset now.
    async fn restart_version(&self, version_id: &VersionId) -> EngineResult<()> {
        let tasks = self.stores.tasks.find_by_version(version_id).await?;
        for mut task in tasks
            .into_iter()
            .filter(|candidate| !candidate.is_part_of_display())
        {
            if task.is_finished() {
                self.try_reset_task(ResetRequest::new(
                    task.id().clone(),
                    Activator::System,
                    ResetOrigin::System,
                ))
                .await?;
            } else if task.is_abortable() {
                task.set_aborted(AbortInfo::by(Activator::System));
                task.set_reset_when_finished();
                self.stores.tasks.update(&task).await?;
            }
        }
        Ok(())
    }

    /// Removes an item and disables its merge task so it never merges.
    ///
    /// Returns the removed item, or `None` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CommitQueueNotFound`] when the project has no
    /// queue, or a store error.
    pub async fn remove_item_and_prevent_merge(
        &self,
        project_id: &ProjectId,
        issue: &str,
        caller: &Activator,
    ) -> EngineResult<Option<CommitQueueItem>> {
        let mut queue = self.fetch_commit_queue(project_id).await?;
        let Some(removed) = queue.remove(issue) else {
            return Ok(None);
        };
        self.stores.commit_queues.update(&queue).await?;

        if let Some(version_id) = removed.version()
            && let Some(mut merge) = self
                .stores
                .tasks
                .find_merge_task_for_version(version_id)
                .await?
        {
            merge.set_disabled_priority(caller.clone());
            self.stores.tasks.update(&merge).await?;
        }
        info!(
            project_id = %project_id,
            issue = %issue,
            caller = %caller,
            "removed commit queue item"
        );
        Ok(Some(removed))
    }

    /// Takes a failed merge test's version out of the commit queue.
    ///
    /// Later processing items are restarted first, while the queue still
    /// shows which ones they are. Then the item is unlinked from the merge
    /// chain and removed, the rest of its patch is cancelled, and `status`
    /// is reported with `reason`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the queue, patch or item is missing,
    /// or the first restart or store failure.
    pub fn dequeue_and_restart_for_task<'a>(
        &'a self,
        task: &'a Task,
        status: ExternalStatus,
        caller: &'a Activator,
        reason: String,
    ) -> BoxFuture<'a, EngineResult<()>> {
        Box::pin(async move {
            let queue = self.fetch_commit_queue(task.project_id()).await?;
            self.restart_items_in_queue_after(&queue, task.version_id(), caller)
                .await?;

            let patch = self.fetch_patch(task.version_id()).await?;
            let issue = patch.id().as_str();
            if let Err(err) = self.remove_next_merge_task_dependency(&queue, issue).await {
                error!(issue = %issue, error = %err, "error removing merge task dependency");
            }

            self.remove_item_and_prevent_merge(task.project_id(), issue, caller)
                .await?
                .ok_or_else(|| EngineError::CommitQueueItemNotFound(issue.to_owned()))?;

            if patch.is_pr_merge() {
                self.report(StatusReport::new(
                    patch.id().clone(),
                    ExternalStatus::Failure,
                    "merge test failed",
                ))
                .await;
            }

            self.cancel_patch(
                patch.id(),
                AbortInfo::by(caller.clone()).caused_by(task.id().clone()),
            )
            .await?;
            self.report(StatusReport::new(task.version_id().clone(), status, reason))
                .await;
            Ok(())
        })
    }

    /// Deactivates a patch's version, builds and tasks, aborting whatever
    /// is running.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::VersionNotFound`] when the version is missing,
    /// or a store error.
    pub async fn cancel_patch(&self, version_id: &VersionId, abort: AbortInfo) -> EngineResult<()> {
        let mut version = self.fetch_version(version_id).await?;
        version.set_activated(false);
        self.stores.versions.update(&version).await?;
        if let Some(mut patch) = self.stores.patches.find_by_id(version_id).await? {
            patch.set_activated(false);
            self.stores.patches.update(&patch).await?;
        }

        let now = self.clock.utc();
        for mut build in self.stores.builds.find_by_version(version_id).await? {
            build.set_activated(false, now);
            self.stores.builds.update(&build).await?;
        }

        let mut builds: BTreeSet<BuildId> = BTreeSet::new();
        let mut aborted = 0_usize;
        for mut task in self.stores.tasks.find_by_version(version_id).await? {
            if task.is_abortable() {
                task.set_aborted(abort.clone());
                aborted = aborted.saturating_add(1);
            }
            task.deactivate(abort.by.clone());
            self.stores.tasks.update(&task).await?;
            builds.insert(task.build_id().clone());
        }
        info!(
            version_id = %version_id,
            aborted,
            caller = %abort.by,
            "cancelled patch"
        );

        let build_ids: Vec<BuildId> = builds.into_iter().collect();
        self.update_version_and_patch_status_for_builds(&build_ids)
            .await
    }
}
