//! Regression hunting on earlier revisions.
//!
//! When a mainline task fails, stepback activates the most recent earlier
//! run of the same task that has not run yet, so bisecting the commit range
//! happens one revision at a time. When a mainline task succeeds, earlier
//! runs that are still waiting may be deactivated instead.

use crate::engine::{EngineError, EngineResult, TaskGraphEngine};
use crate::task::domain::{Activator, Requester, Task, TaskId, TaskRunKey, TaskStatus};
use futures::future::BoxFuture;
use mockable::Clock;
use tracing::{debug, info};

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Reacts to a finished non-patch task.
    ///
    /// A plain failure of a task that was not aborted steps back when the
    /// project allows it; members of a single-host group step back every
    /// member up to and including the failing one. A success of a mainline
    /// task deactivates earlier waiting runs when `deactivate_previous`, or
    /// the project policy if that is `None`, asks for it.
    ///
    /// # Errors
    ///
    /// Returns an error when the policy lookup or a store fails.
    pub async fn eval_stepback(
        &self,
        task: &Task,
        caller: &Activator,
        status: TaskStatus,
        deactivate_previous: Option<bool>,
    ) -> EngineResult<()> {
        if status == TaskStatus::Failed && !task.aborted() {
            let policy = self.policy_for(task).await?;
            if !policy.stepback_enabled(task.build_variant(), task.display_name()) {
                debug!(task_id = %task.id(), "stepback disabled for task");
                return Ok(());
            }
            return self.stepback_failed(task).await;
        }

        if status == TaskStatus::Succeeded && task.requester() == Requester::Mainline {
            let deactivate = match deactivate_previous {
                Some(requested) => requested,
                None => self.policy_for(task).await?.deactivate_previous,
            };
            if deactivate {
                return self.deactivate_previous_tasks(task, caller).await;
            }
        }
        Ok(())
    }

    async fn stepback_failed(&self, task: &Task) -> EngineResult<()> {
        let Some(group) = task
            .task_group()
            .filter(|_| task.is_part_of_single_host_task_group())
        else {
            return self.do_stepback(task).await;
        };

        let members = self
            .stores
            .tasks
            .find_task_group(task.build_id(), &group.name)
            .await?;
        if members.is_empty() {
            return Err(EngineError::EmptyTaskGroup {
                build_id: task.build_id().clone(),
                group: group.name.clone(),
            });
        }
        for member in &members {
            self.do_stepback(member).await?;
            if member.id() == task.id() {
                break;
            }
        }
        Ok(())
    }

    /// Steps back a single task, or every execution task of a display task.
    ///
    /// With `stepback_requires_prior_success` configured, nothing happens
    /// unless some earlier run succeeded, so a task that never passed does
    /// not walk back through history forever.
    pub fn do_stepback<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, EngineResult<()>> {
        Box::pin(async move {
            if task.display_only() {
                for execution_task in self
                    .stores
                    .tasks
                    .find_by_ids(task.execution_tasks())
                    .await?
                {
                    self.do_stepback(&execution_task).await?;
                }
            }

            if self.config.stepback_requires_prior_success && !self.has_prior_success(task).await?
            {
                debug!(task_id = %task.id(), "no earlier successful run, skipping stepback");
                return Ok(());
            }
            self.activate_previous_task(task.id().clone(), None).await
        })
    }

    async fn has_prior_success(&self, task: &Task) -> EngineResult<bool> {
        Ok(self
            .stores
            .tasks
            .find_runs_before(&task.run_key(), task.revision_order_number())
            .await?
            .iter()
            .any(|run| run.status() == TaskStatus::Succeeded))
    }

    /// Activates the closest earlier run of a task.
    ///
    /// Nothing happens when there is none, or when it already finished, is
    /// disabled or is already activated. A generated task whose closest run
    /// is not from the immediately preceding revision did not exist in
    /// between, so the generator's earlier run is activated instead and
    /// told which generated task to activate once it runs.
    pub fn activate_previous_task(
        &self,
        task_id: TaskId,
        stepback_task: Option<Task>,
    ) -> BoxFuture<'_, EngineResult<()>> {
        Box::pin(async move {
            let task = self.fetch_task(&task_id).await?;
            let previous = self
                .stores
                .tasks
                .find_runs_before(&task.run_key(), task.revision_order_number())
                .await?
                .into_iter()
                .next();

            if let (Some(generator), Some(earlier)) = (task.generated_by(), previous.as_ref())
                && earlier.revision_order_number().saturating_add(1) != task.revision_order_number()
            {
                return self
                    .activate_previous_task(generator.clone(), Some(task.clone()))
                    .await;
            }

            let Some(earlier) = previous.filter(|run| {
                !run.is_finished() && run.priority() >= 0 && !run.activated()
            }) else {
                return Ok(());
            };

            self.set_active_state(&Activator::Stepback, true, std::slice::from_ref(&earlier))
                .await?;
            info!(
                task_id = %earlier.id(),
                failing_task_id = %task.id(),
                "activated earlier run for stepback"
            );

            if let Some(generated) = stepback_task.filter(|_| earlier.generate_task()) {
                let mut generator = self.fetch_task(earlier.id()).await?;
                generator
                    .set_generated_task_to_activate(generated.build_variant(), generated.display_name());
                self.stores.tasks.update(&generator).await?;
            }
            Ok(())
        })
    }

    /// Deactivates earlier mainline runs of the task that are activated but
    /// not yet dispatched.
    ///
    /// For a display task, earlier display tasks whose execution tasks have
    /// neither started nor finished take their execution tasks with them.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub async fn deactivate_previous_tasks(&self, task: &Task, caller: &Activator) -> EngineResult<()> {
        let key = TaskRunKey {
            requester: None,
            ..task.run_key()
        };
        let waiting: Vec<Task> = self
            .stores
            .tasks
            .find_runs_before(&key, task.revision_order_number())
            .await?
            .into_iter()
            .filter(|run| run.activated() && run.status() == TaskStatus::Undispatched)
            .collect();

        let mut extra = Vec::new();
        if task.display_only() {
            for display in &waiting {
                if display.execution_tasks().is_empty() {
                    continue;
                }
                let executions = self
                    .stores
                    .tasks
                    .find_by_ids(display.execution_tasks())
                    .await?;
                if executions
                    .iter()
                    .all(|execution| !execution.is_finished() && !execution.is_abortable())
                {
                    extra.extend(executions);
                }
            }
        }

        for run in waiting.into_iter().chain(extra) {
            if run.requester().is_patch() {
                continue;
            }
            self.set_active_state(caller, false, std::slice::from_ref(&run))
                .await?;
        }
        Ok(())
    }
}
