//! Scheduling, unscheduling and aborting tasks.

use crate::engine::{EngineError, EngineResult, ErrorKind, TaskGraphEngine};
use crate::reporting::domain::ExternalStatus;
use crate::task::domain::{AbortInfo, Activator, BuildId, Requester, Task, TaskId, VersionId};
use mockable::Clock;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Activates or deactivates tasks.
    ///
    /// Activating a task also activates its unfinished upstream
    /// dependencies unless it overrides them; finished dependencies in the
    /// same single-host group are reset instead, since the group must run
    /// again in order. Versions, builds and patches of activated tasks are
    /// marked activated.
    ///
    /// Deactivation only applies when the caller is a user or the task was
    /// activated by automation, so automation never undoes a user's choice.
    /// It also covers later members of a single-host group, and takes a
    /// merge-test version out of the commit queue.
    ///
    /// Display tasks always carry their execution tasks with them. Status
    /// rolls up for every build touched.
    ///
    /// # Errors
    ///
    /// Returns the first store or lookup failure.
    pub async fn set_active_state(
        &self,
        caller: &Activator,
        active: bool,
        tasks: &[Task],
    ) -> EngineResult<()> {
        let mut to_change: Vec<TaskId> = Vec::new();
        let mut versions: BTreeSet<VersionId> = BTreeSet::new();

        for task in tasks {
            let mut originals = vec![task.clone()];
            if task.display_only() {
                originals.extend(
                    self.stores
                        .tasks
                        .find_by_ids(task.execution_tasks())
                        .await?,
                );
            }

            if active {
                versions.insert(task.version_id().clone());
                if !task.override_dependencies() {
                    for dependency in self.dependencies_up(&originals).await? {
                        if needs_group_reset(task, &dependency) {
                            self.reset_task(dependency.id(), caller).await?;
                        } else if !dependency.is_finished() {
                            to_change.push(dependency.id().clone());
                        }
                    }
                }
            } else if !caller.is_system() || task.activated_by().is_some_and(Activator::is_system)
            {
                originals.extend(self.later_group_members(task).await?);
                if task.requester() == Requester::MergeTest {
                    self.dequeue_after_deactivation(task, caller).await?;
                }
            } else {
                debug!(
                    task_id = %task.id(),
                    caller = %caller,
                    "leaving task activated by a user"
                );
                continue;
            }
            to_change.extend(originals.iter().map(|original| original.id().clone()));
        }

        let changed = self.apply_activation(caller, active, &to_change).await?;
        if active {
            self.activate_containers(&changed, &versions).await?;
        }
        self.refresh_display_tasks(&changed).await?;

        let builds: Vec<BuildId> = changed
            .iter()
            .map(|task| task.build_id().clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.update_version_and_patch_status_for_builds(&builds).await
    }

    /// Looks a task up and activates or deactivates it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`] when the task does not exist,
    /// or any error from [`Self::set_active_state`].
    pub async fn set_active_state_by_id(
        &self,
        task_id: &TaskId,
        caller: &Activator,
        active: bool,
    ) -> EngineResult<()> {
        let task = self.fetch_task(task_id).await?;
        self.set_active_state(caller, active, &[task]).await
    }

    /// Deactivates a running task and records the abort request.
    ///
    /// Execution tasks of a display task are aborted first; those that are
    /// not running are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotAbortable`] when the task is not running.
    pub async fn abort_task(&self, task_id: &TaskId, caller: &Activator) -> EngineResult<()> {
        let task = self.fetch_task(task_id).await?;
        if task.display_only() {
            for execution_id in task.execution_tasks() {
                if let Err(err) = self.abort_single(execution_id, caller).await {
                    debug!(
                        task_id = %execution_id,
                        error = %err,
                        "skipping execution task that cannot be aborted"
                    );
                }
            }
        }
        self.abort_single(task_id, caller).await
    }

    async fn abort_single(&self, task_id: &TaskId, caller: &Activator) -> EngineResult<()> {
        let task = self.fetch_task(task_id).await?;
        if !task.is_abortable() {
            return Err(EngineError::NotAbortable {
                task_id: task_id.clone(),
                status: task.status(),
            });
        }
        self.set_active_state(caller, false, &[task]).await?;

        let mut aborted = self.fetch_task(task_id).await?;
        aborted.set_aborted(AbortInfo::by(caller.clone()));
        self.stores.tasks.update(&aborted).await?;
        info!(
            task_id = %task_id,
            execution = aborted.execution(),
            caller = %caller,
            "task abort requested"
        );
        Ok(())
    }

    /// Returns every task upstream of `roots`, each once.
    async fn dependencies_up(&self, roots: &[Task]) -> EngineResult<Vec<Task>> {
        let mut seen: HashSet<TaskId> = roots.iter().map(|root| root.id().clone()).collect();
        let mut pending: Vec<TaskId> = roots
            .iter()
            .flat_map(|root| root.depends_on().iter().map(|dep| dep.task_id.clone()))
            .collect();
        let mut found = Vec::new();

        while !pending.is_empty() {
            let batch: Vec<TaskId> = pending
                .drain(..)
                .filter(|id| seen.insert(id.clone()))
                .collect();
            if batch.is_empty() {
                break;
            }
            for upstream in self.stores.tasks.find_by_ids(&batch).await? {
                pending.extend(upstream.depends_on().iter().map(|dep| dep.task_id.clone()));
                found.push(upstream);
            }
        }
        Ok(found)
    }

    async fn later_group_members(&self, task: &Task) -> EngineResult<Vec<Task>> {
        let Some(group) = task
            .task_group()
            .filter(|_| task.is_part_of_single_host_task_group())
        else {
            return Ok(Vec::new());
        };
        Ok(self
            .stores
            .tasks
            .find_task_group(task.build_id(), &group.name)
            .await?
            .into_iter()
            .filter(|member| {
                member
                    .task_group()
                    .is_some_and(|membership| membership.order > group.order)
            })
            .collect())
    }

    async fn dequeue_after_deactivation(&self, task: &Task, caller: &Activator) -> EngineResult<()> {
        let result = self
            .dequeue_and_restart_for_task(
                task,
                ExternalStatus::Error,
                caller,
                format!("deactivated by '{caller}'"),
            )
            .await;
        match result {
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    task_id = %task.id(),
                    error = %err,
                    "merge test task is not in the commit queue"
                );
                Ok(())
            }
            other => other,
        }
    }

    /// Persists the activation change, returning the updated tasks.
    async fn apply_activation(
        &self,
        caller: &Activator,
        active: bool,
        ids: &[TaskId],
    ) -> EngineResult<Vec<Task>> {
        let mut unique = HashSet::new();
        let ordered: Vec<TaskId> = ids
            .iter()
            .filter(|id| unique.insert(*id))
            .cloned()
            .collect();

        let mut changed = Vec::with_capacity(ordered.len());
        for mut task in self.stores.tasks.find_by_ids(&ordered).await? {
            if active {
                task.activate(caller.clone(), &*self.clock);
            } else {
                task.deactivate(caller.clone());
            }
            self.stores.tasks.update(&task).await?;
            changed.push(task);
        }
        info!(
            count = changed.len(),
            active,
            caller = %caller,
            "changed task activation"
        );
        Ok(changed)
    }

    async fn activate_containers(
        &self,
        changed: &[Task],
        versions: &BTreeSet<VersionId>,
    ) -> EngineResult<()> {
        let now = self.clock.utc();
        let builds: BTreeSet<&BuildId> = changed.iter().map(Task::build_id).collect();
        for build_id in builds {
            let mut build = self.fetch_build(build_id).await?;
            if !build.activated() {
                build.set_activated(true, now);
                self.stores.builds.update(&build).await?;
            }
        }

        let all_versions: BTreeSet<&VersionId> = changed
            .iter()
            .map(Task::version_id)
            .chain(versions.iter())
            .collect();
        for version_id in all_versions {
            let mut version = self.fetch_version(version_id).await?;
            if !version.activated() {
                version.set_activated(true);
                self.stores.versions.update(&version).await?;
            }
            if version.requester().is_patch()
                && let Some(mut patch) = self.stores.patches.find_by_id(version_id).await?
                && !patch.activated()
            {
                patch.set_activated(true);
                self.stores.patches.update(&patch).await?;
            }
        }
        Ok(())
    }

    async fn refresh_display_tasks(&self, changed: &[Task]) -> EngineResult<()> {
        let displays: BTreeSet<&TaskId> = changed
            .iter()
            .filter_map(Task::display_task_id)
            .collect();
        for display_id in displays {
            self.refresh_display_task(display_id).await?;
        }
        Ok(())
    }
}

/// Finished upstream members of the same single-host group are rerun rather
/// than activated.
fn needs_group_reset(task: &Task, dependency: &Task) -> bool {
    task.is_part_of_single_host_task_group()
        && dependency.is_finished()
        && task.task_group_name().is_some()
        && dependency.task_group_name() == task.task_group_name()
        && dependency.build_id() == task.build_id()
}
