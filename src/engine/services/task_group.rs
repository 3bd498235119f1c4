//! Single-host task group sequencing.

use crate::config::TaskGroupReconciliation;
use crate::engine::{EngineError, EngineResult, TaskGraphEngine};
use crate::task::domain::{Activator, Task, TaskId};
use mockable::Clock;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::display::is_still_due;

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Resets a single-host task group as a unit once it has run.
    ///
    /// Nothing happens while any member still has to run, or when no member
    /// asked for a reset. After the reset the group is re-read and members
    /// still blocked on an earlier sibling are repaired or reported,
    /// following [`TaskGroupReconciliation`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyTaskGroup`] when the group has no
    /// members, or a store error.
    pub async fn check_reset_single_host_task_group(
        &self,
        task: &Task,
        caller: &Activator,
    ) -> EngineResult<()> {
        let Some(group) = task
            .task_group()
            .filter(|_| task.is_part_of_single_host_task_group())
        else {
            return Ok(());
        };

        let members = self.group_members(task, &group.name).await?;
        if members.iter().any(is_still_due) {
            debug!(task_id = %task.id(), group = %group.name, "task group still running");
            return Ok(());
        }
        if !members.iter().any(Task::reset_when_finished) {
            return Ok(());
        }

        for member in &members {
            self.reset_task(member.id(), caller).await?;
        }
        info!(
            build_id = %task.build_id(),
            group = %group.name,
            members = members.len(),
            caller = %caller,
            "task group restarted"
        );

        let reset = self.group_members(task, &group.name).await?;
        self.reconcile_group_edges(reset).await
    }

    async fn group_members(&self, task: &Task, group: &str) -> EngineResult<Vec<Task>> {
        let members = self
            .stores
            .tasks
            .find_task_group(task.build_id(), group)
            .await?;
        if members.is_empty() {
            return Err(EngineError::EmptyTaskGroup {
                build_id: task.build_id().clone(),
                group: group.to_owned(),
            });
        }
        Ok(members)
    }

    /// Finds members blocked on an earlier sibling right after a reset.
    async fn reconcile_group_edges(&self, members: Vec<Task>) -> EngineResult<()> {
        let mut earlier: HashSet<TaskId> = HashSet::new();
        for mut member in members {
            let stale: Vec<TaskId> = member
                .depends_on()
                .iter()
                .filter(|dep| dep.unattainable && earlier.contains(&dep.task_id))
                .map(|dep| dep.task_id.clone())
                .collect();
            earlier.insert(member.id().clone());
            if stale.is_empty() {
                continue;
            }

            for sibling in &stale {
                warn!(
                    blocked_task = %member.id(),
                    execution = member.execution(),
                    unattainable_dependency = %sibling,
                    "task group task was blocked on an earlier task group task after reset"
                );
            }
            if self.config.task_group_reconciliation == TaskGroupReconciliation::Repair {
                for sibling in &stale {
                    member.mark_dependency_unattainable(sibling, false);
                }
                self.stores.tasks.update(&member).await?;
            }
        }
        Ok(())
    }
}
