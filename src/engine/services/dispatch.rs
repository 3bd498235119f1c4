//! Host assignment bookkeeping.

use crate::engine::{EngineError, EngineResult, TaskGraphEngine};
use crate::task::domain::{HostAssignment, TaskId, TaskStatus};
use mockable::Clock;
use tracing::{info, warn};

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Records that a dispatcher handed the task to a host.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotDispatchable`] unless the task is
    /// undispatched, activated and unblocked.
    pub async fn mark_host_task_dispatched(
        &self,
        task_id: &TaskId,
        host: HostAssignment,
    ) -> EngineResult<()> {
        let mut task = self.fetch_task(task_id).await?;
        if !task.is_dispatchable() {
            return Err(EngineError::NotDispatchable {
                task_id: task_id.clone(),
                status: task.status(),
            });
        }
        let host_id = host.host_id.clone();
        task.mark_dispatched(host, &*self.clock);
        self.stores.tasks.update(&task).await?;
        info!(
            task_id = %task.id(),
            execution = task.execution(),
            host_id = %host_id,
            "task dispatched"
        );

        if task.is_part_of_display() {
            self.update_display_task_for_task(&task).await?;
        }
        Ok(())
    }

    /// Returns a dispatched task to the queue. Tasks that already started
    /// or finished are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing or a store fails.
    pub async fn mark_host_task_undispatched(&self, task_id: &TaskId) -> EngineResult<()> {
        let mut task = self.fetch_task(task_id).await?;
        if task.status() != TaskStatus::Dispatched {
            warn!(
                task_id = %task_id,
                status = %task.status(),
                "ignoring undispatch of task that is not dispatched"
            );
            return Ok(());
        }
        let host_id = task.host().map(|host| host.host_id.clone()).unwrap_or_default();
        task.mark_undispatched();
        self.stores.tasks.update(&task).await?;
        info!(
            task_id = %task.id(),
            execution = task.execution(),
            host_id = %host_id,
            "task undispatched"
        );

        if task.is_part_of_display() {
            self.update_display_task_for_task(&task).await?;
        }
        Ok(())
    }
}
