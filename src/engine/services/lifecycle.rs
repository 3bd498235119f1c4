//! Task start and finish, and everything a finish sets in motion.

use crate::engine::{EngineError, EngineResult, ResetRequest, TaskGraphEngine};
use crate::reporting::domain::ExternalStatus;
use crate::rollup::domain::{BuildStatus, PatchStatus, VersionStatus};
use crate::task::domain::{
    ABORTED_DESCRIPTION, Activator, FAILED_TESTS_DESCRIPTION, NO_RESULTS_DESCRIPTION, Requester,
    ResetOrigin, Task, TaskEndDetail, TaskId, TaskStatus,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::time::Instant;
use tracing::{info, warn};

/// Aggregate documents `mark_start` moved out of `created`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusChanges {
    /// New build status, when the build changed.
    pub build: Option<BuildStatus>,
    /// New version status, when the version changed.
    pub version: Option<VersionStatus>,
    /// New patch status, when the patch changed.
    pub patch: Option<PatchStatus>,
}

/// A worker's report that a task execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkEndRequest {
    task_id: TaskId,
    caller: Activator,
    finish_time: Option<DateTime<Utc>>,
    detail: TaskEndDetail,
    deactivate_previous: Option<bool>,
}

impl MarkEndRequest {
    /// Creates a request finishing now with `detail`, taking the
    /// deactivate-previous policy from the project.
    #[must_use]
    pub const fn new(task_id: TaskId, caller: Activator, detail: TaskEndDetail) -> Self {
        Self {
            task_id,
            caller,
            finish_time: None,
            detail,
            deactivate_previous: None,
        }
    }

    /// Records an explicit finish time.
    #[must_use]
    pub const fn finished_at(mut self, finish_time: DateTime<Utc>) -> Self {
        self.finish_time = Some(finish_time);
        self
    }

    /// Overrides the project's deactivate-previous policy.
    #[must_use]
    pub const fn with_deactivate_previous(mut self, deactivate_previous: bool) -> Self {
        self.deactivate_previous = Some(deactivate_previous);
        self
    }

    /// Returns the task being finished.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the reported end detail.
    #[must_use]
    pub const fn detail(&self) -> &TaskEndDetail {
        &self.detail
    }
}

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Records that a task started running.
    ///
    /// Moves its build, version and, for patch requesters, patch to
    /// `started` when they were still `created`, and refreshes the display
    /// task of an execution task. Starting twice overwrites the start time.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotStartable`] when the task is not activated
    /// or has already finished.
    pub async fn mark_start(&self, task_id: &TaskId) -> EngineResult<StatusChanges> {
        let mut task = self.fetch_task(task_id).await?;
        if !task.activated() || task.is_finished() {
            return Err(EngineError::NotStartable {
                task_id: task_id.clone(),
                status: task.status(),
                activated: task.activated(),
            });
        }

        let start_time = self.clock.utc();
        task.mark_start(start_time);
        self.stores.tasks.update(&task).await?;
        info!(task_id = %task.id(), execution = task.execution(), "task started");

        let mut changes = StatusChanges::default();
        let mut build = self.fetch_build(task.build_id()).await?;
        if build.mark_started(start_time) {
            self.stores.builds.update(&build).await?;
            changes.build = Some(BuildStatus::Started);
        }
        let mut version = self.fetch_version(task.version_id()).await?;
        if version.mark_started(start_time) {
            self.stores.versions.update(&version).await?;
            changes.version = Some(VersionStatus::Started);
        }
        if task.requester().is_patch()
            && let Some(mut patch) = self.stores.patches.find_by_id(task.version_id()).await?
            && patch.mark_started(start_time)
        {
            self.stores.patches.update(&patch).await?;
            changes.patch = Some(PatchStatus::Started);
        }

        if task.is_part_of_display() {
            self.update_display_task_for_task(&task).await?;
        }
        Ok(changes)
    }

    /// Records that a task finished and reacts to it.
    ///
    /// The reported status is corrected first: recorded test failures turn
    /// it into `failed`, an aborted task never succeeds, and a task that must
    /// have results fails without them. Reporting the stored status again is
    /// a logged no-op, as is losing the race against a concurrent finish.
    ///
    /// After the store update: dependents are blocked or have their edge
    /// marked finished, the display task or task group is checked, stepback
    /// runs for non-patch requesters, status rolls up for the task's build
    /// and every build a newly blocked dependent lives in, a failed merge test
    /// leaves the commit queue, and a deferred reset is carried out.
    ///
    /// # Errors
    ///
    /// Returns an error when a document is missing, a store fails, or a
    /// collaborator fails.
    pub async fn mark_end(&self, request: MarkEndRequest) -> EngineResult<()> {
        let mut task = self.fetch_task(&request.task_id).await?;
        let previous_status = task.status();
        let Some(detail) = corrected_detail(&task, &request.detail) else {
            warn!(
                task_id = %task.id(),
                status = %previous_status,
                "tried to mark task as finished twice"
            );
            return Ok(());
        };
        if task.start_time().is_none() {
            warn!(
                task_id = %task.id(),
                execution = task.execution(),
                requester = %task.requester(),
                "task is missing start time"
            );
        }

        let finish_time = request.finish_time.unwrap_or_else(|| self.clock.utc());
        task.mark_end(finish_time, detail);
        let started = Instant::now();
        let stored = self
            .stores
            .tasks
            .update_if_status(&task, previous_status)
            .await?;
        self.warn_if_slow("mark_end", "update_if_status", task.id(), started);
        if !stored {
            warn!(
                task_id = %task.id(),
                status = %previous_status,
                "task changed status concurrently, treating as already finished"
            );
            return Ok(());
        }

        let blocked_builds = self.update_blocked_dependencies(&task).await?;
        self.mark_dependents_finished(&task, true).await?;
        info!(
            task_id = %task.id(),
            execution = task.execution(),
            status = %task.status(),
            operation = "mark_end",
            host_id = task.host().map_or("", |host| host.host_id.as_str()),
            "marking task finished"
        );

        self.check_containers_after_end(&task, &request.caller).await?;
        self.stepback_after_end(&task, &request).await?;
        self.update_build_and_version_status_for_task(&task).await?;
        self.update_dependent_builds(task.build_id(), blocked_builds)
            .await?;

        if task.requester() == Requester::MergeTest
            && task.status().is_failure()
            && !task.aborted()
        {
            self.dequeue_and_restart_for_task(
                &task,
                ExternalStatus::Failure,
                &request.caller,
                format!("merge test task '{}' failed", task.display_name()),
            )
            .await?;
        }

        if task.reset_when_finished()
            && !task.is_part_of_display()
            && !task.is_part_of_single_host_task_group()
        {
            let mut reset =
                ResetRequest::new(task.id().clone(), Activator::ApiServer, ResetOrigin::ApiServer);
            if let Some(end) = task.details() {
                reset = reset.with_detail(end.clone());
            }
            return self.try_reset_task(reset).await;
        }
        Ok(())
    }

    /// Refreshes and checks the display task, or the single-host group, the
    /// finished task belongs to.
    async fn check_containers_after_end(&self, task: &Task, caller: &Activator) -> EngineResult<()> {
        if let Some(display_id) = task.display_task_id() {
            self.refresh_display_task(display_id).await?;
            let display = self.fetch_task(display_id).await?;
            return self.check_reset_display_task(&display).await;
        }
        if task.is_part_of_single_host_task_group() {
            return self.check_reset_single_host_task_group(task, caller).await;
        }
        Ok(())
    }

    async fn stepback_after_end(&self, task: &Task, request: &MarkEndRequest) -> EngineResult<()> {
        if task.requester().is_patch() {
            return Ok(());
        }
        if let Some(display_id) = task.display_task_id() {
            let display = self.fetch_task(display_id).await?;
            return self
                .eval_stepback(
                    &display,
                    &request.caller,
                    display.status(),
                    request.deactivate_previous,
                )
                .await;
        }
        self.eval_stepback(task, &request.caller, task.status(), request.deactivate_previous)
            .await
    }
}

/// Applies the end-status corrections, returning `None` for a repeated
/// finish.
fn corrected_detail(task: &Task, reported: &TaskEndDetail) -> Option<TaskEndDetail> {
    let mut detail = reported.clone();
    if task.has_failed_tests() && detail.status() != TaskStatus::Failed {
        detail.downgrade(TaskStatus::Failed, FAILED_TESTS_DESCRIPTION);
    }
    if task.aborted() && detail.status() == TaskStatus::Succeeded {
        detail.downgrade(TaskStatus::Failed, ABORTED_DESCRIPTION);
    }
    if task.status() == detail.status() {
        return None;
    }
    if detail.status() == TaskStatus::Succeeded
        && task.must_have_results()
        && !task.has_test_results()
    {
        detail.downgrade(TaskStatus::Failed, NO_RESULTS_DESCRIPTION);
    }
    Some(detail)
}
