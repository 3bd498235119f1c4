//! Display tasks: status borrowed from their execution tasks.

use crate::engine::{EngineError, EngineResult, ResetRequest, TaskGraphEngine};
use crate::task::domain::{
    Activator, DisplayRollup, ResetOrigin, Task, TaskEndDetail, TaskId, TaskStatus,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info};

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Re-derives the display task that `execution_task` belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotExecutionTask`] when the task has no
    /// display task, or a not-found error when the display task is missing.
    pub async fn update_display_task_for_task(&self, execution_task: &Task) -> EngineResult<()> {
        let display_id = execution_task
            .display_task_id()
            .ok_or_else(|| EngineError::NotExecutionTask(execution_task.id().clone()))?;
        self.refresh_display_task(display_id).await
    }

    pub(crate) async fn refresh_display_task(&self, display_id: &TaskId) -> EngineResult<()> {
        let mut display_task = self.fetch_task(display_id).await?;
        let executions = self
            .stores
            .tasks
            .find_by_ids(display_task.execution_tasks())
            .await?;
        let Some(rollup) = display_rollup(&executions, self.clock.utc()) else {
            debug!(task_id = %display_id, "display task has no execution tasks");
            return Ok(());
        };

        let was_finished = display_task.is_finished();
        display_task.apply_display_rollup(rollup);
        self.stores.tasks.update(&display_task).await?;
        if !was_finished && display_task.is_finished() {
            info!(
                task_id = %display_task.id(),
                status = %display_task.status(),
                operation = "update_display_task_for_task",
                "display task finished"
            );
        }
        Ok(())
    }

    /// Resets a display task flagged `reset_when_finished` once none of its
    /// execution tasks is still due to run.
    ///
    /// A display task that has not finished is first failed with a system
    /// failure so the reset is not refused.
    ///
    /// # Errors
    ///
    /// Returns an error when a store fails or the reset is refused.
    pub async fn check_reset_display_task(&self, display_task: &Task) -> EngineResult<()> {
        if !display_task.reset_when_finished() {
            return Ok(());
        }
        let executions = self
            .stores
            .tasks
            .find_by_ids(display_task.execution_tasks())
            .await?;
        if executions.iter().any(is_still_due) {
            return Ok(());
        }

        let detail = if display_task.is_finished() {
            display_task.details().cloned()
        } else {
            Some(TaskEndDetail::system_failed())
        };
        let mut request =
            ResetRequest::new(display_task.id().clone(), Activator::System, ResetOrigin::System);
        if let Some(end) = detail {
            request = request.with_detail(end);
        }
        self.try_reset_task(request).await
    }
}

/// Returns `true` for a task that is activated, unfinished and unblocked.
pub(crate) fn is_still_due(task: &Task) -> bool {
    !task.is_finished() && !task.blocked() && task.activated()
}

fn display_rollup(executions: &[Task], now: DateTime<Utc>) -> Option<DisplayRollup> {
    let speaker = executions
        .iter()
        .min_by_key(|task| task.status().display_rank())?;
    let activated = executions.iter().any(Task::activated);
    let has_finished = executions.iter().any(Task::is_finished);
    let has_runnable = executions.iter().any(|task| {
        !task.is_finished() && (task.is_dispatchable() || task.is_abortable()) && !task.blocked()
    });

    let (status, details) = if has_finished && has_runnable {
        (TaskStatus::Started, None)
    } else {
        (speaker.status(), speaker.details().cloned())
    };

    Some(DisplayRollup {
        status,
        details,
        activated,
        activated_time: activated.then_some(now),
        time_taken: executions.iter().map(Task::time_taken).sum(),
        start_time: executions.iter().filter_map(Task::start_time).min(),
        finish_time: if has_runnable {
            None
        } else {
            executions.iter().filter_map(Task::finish_time).max()
        },
    })
}
