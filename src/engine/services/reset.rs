//! Starting new executions of tasks.

use crate::engine::{EngineError, EngineResult, MarkEndRequest, TaskGraphEngine};
use crate::task::domain::{
    Activator, BuildId, EXECUTION_CAP_DESCRIPTION, ResetOrigin, Task, TaskEndDetail, TaskId,
};
use futures::future::BoxFuture;
use mockable::Clock;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// A request to run a task again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    task_id: TaskId,
    caller: Activator,
    origin: ResetOrigin,
    detail: Option<TaskEndDetail>,
}

impl ResetRequest {
    /// Creates a request without an end detail.
    #[must_use]
    pub const fn new(task_id: TaskId, caller: Activator, origin: ResetOrigin) -> Self {
        Self {
            task_id,
            caller,
            origin,
            detail: None,
        }
    }

    /// Records how the current execution ended before it is reset.
    #[must_use]
    pub fn with_detail(mut self, detail: TaskEndDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Returns the task to reset.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }
}

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Resets a task if its origin and state allow it.
    ///
    /// Once a task has used up its executions only UI and REST origins may
    /// reset it; for other origins an unfinished task is failed instead
    /// (with the request's detail, or a system failure) and a finished one
    /// is left alone. UI and REST origins may not reset an unfinished task.
    /// Members of a single-host task group are flagged and left to the group
    /// sequencer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ExecutionTaskOfDisplay`] for execution tasks,
    /// [`EngineError::NotResettable`] when an interactive origin asks to
    /// reset a running task, or a store error.
    pub fn try_reset_task(&self, request: ResetRequest) -> BoxFuture<'_, EngineResult<()>> {
        Box::pin(async move {
            let mut task = self.fetch_task(&request.task_id).await?;
            if task.is_part_of_display() {
                return Err(EngineError::ExecutionTaskOfDisplay(task.id().clone()));
            }

            if task.execution() >= self.config.max_task_execution {
                if request.origin.is_interactive() {
                    debug!(
                        task_id = %task.id(),
                        caller = %request.caller,
                        "allowing reset past the execution cap"
                    );
                } else if task.is_finished() {
                    debug!(task_id = %task.id(), "task reached its execution cap");
                    return Ok(());
                } else {
                    return self.fail_at_execution_cap(&task, request).await;
                }
            }

            if !task.is_finished() && request.origin.is_interactive() {
                return Err(EngineError::NotResettable {
                    task_id: task.id().clone(),
                    reason: format!("task currently has status '{}'", task.status()),
                });
            }

            if let Some(detail) = request.detail {
                task.mark_end(self.clock.utc(), detail);
                self.stores.tasks.update(&task).await?;
            }

            let caller = if request.origin.is_interactive() {
                request.caller
            } else {
                request.origin.activator()
            };
            if task.is_part_of_single_host_task_group() {
                task.set_reset_when_finished();
                self.stores.tasks.update(&task).await?;
                return self.check_reset_single_host_task_group(&task, &caller).await;
            }
            self.reset_task(task.id(), &caller).await
        })
    }

    /// Redirects an execution task to its display task, which is flagged to
    /// reset once its execution tasks are done. Other tasks go through
    /// [`Self::try_reset_task`].
    ///
    /// # Errors
    ///
    /// Returns an error when the reset is refused or a store fails.
    pub async fn reset_task_or_display_task(
        &self,
        task: &Task,
        caller: &Activator,
        origin: ResetOrigin,
        detail: Option<TaskEndDetail>,
    ) -> EngineResult<()> {
        let display = match task.display_task_id() {
            Some(display_id) => self.stores.tasks.find_by_id(display_id).await?,
            None => None,
        };
        let mut target = display.unwrap_or_else(|| task.clone());
        if target.display_only() {
            target.set_reset_when_finished();
            self.stores.tasks.update(&target).await?;
            return self.check_reset_display_task(&target).await;
        }

        let mut request = ResetRequest::new(task.id().clone(), caller.clone(), origin);
        if let Some(end) = detail {
            request = request.with_detail(end);
        }
        self.try_reset_task(request).await
    }

    /// Archives the current execution and starts the next one.
    ///
    /// Display tasks reset their execution tasks with them. Edges onto the
    /// reset tasks are reopened and status rolls up again.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ExecutionTaskOfDisplay`] for execution tasks,
    /// or a store error.
    pub async fn reset_task(&self, task_id: &TaskId, caller: &Activator) -> EngineResult<()> {
        let mut task = self.fetch_task(task_id).await?;
        if task.is_part_of_display() {
            return Err(EngineError::ExecutionTaskOfDisplay(task_id.clone()));
        }

        self.stores.tasks.archive(&task).await?;
        let mut unblocked_builds = BTreeSet::new();
        if task.display_only() {
            for mut execution_task in self
                .stores
                .tasks
                .find_by_ids(task.execution_tasks())
                .await?
            {
                self.stores.tasks.archive(&execution_task).await?;
                unblocked_builds.extend(
                    self.mark_one_task_reset(&mut execution_task, caller)
                        .await?,
                );
            }
        }
        unblocked_builds.extend(self.mark_one_task_reset(&mut task, caller).await?);
        info!(
            task_id = %task.id(),
            execution = task.execution(),
            caller = %caller,
            "task restarted"
        );

        self.update_build_and_version_status_for_task(&task).await?;
        self.update_dependent_builds(task.build_id(), unblocked_builds)
            .await
    }

    /// Resets one task and reopens the edges onto it, returning the builds
    /// of the dependents that changed.
    async fn mark_one_task_reset(
        &self,
        task: &mut Task,
        caller: &Activator,
    ) -> EngineResult<BTreeSet<BuildId>> {
        task.reset(&*self.clock);
        task.activate(caller.clone(), &*self.clock);
        self.stores.tasks.update(task).await?;
        let unblocked = self.update_unblocked_dependencies(task).await?;
        self.mark_dependents_finished(task, false).await?;
        Ok(unblocked)
    }

    async fn fail_at_execution_cap(&self, task: &Task, request: ResetRequest) -> EngineResult<()> {
        debug!(
            task_id = %task.id(),
            max_execution = self.config.max_task_execution,
            "task reached its execution cap, marking it failed"
        );
        let detail = request.detail.unwrap_or_else(|| {
            TaskEndDetail::system_failed().with_description(EXECUTION_CAP_DESCRIPTION)
        });
        if task.display_only() {
            for execution_id in task.execution_tasks() {
                self.mark_end(
                    MarkEndRequest::new(execution_id.clone(), request.caller.clone(), detail.clone())
                        .with_deactivate_previous(false),
                )
                .await?;
            }
        }
        self.mark_end(
            MarkEndRequest::new(task.id().clone(), request.caller, detail)
                .with_deactivate_previous(false),
        )
        .await
    }
}
