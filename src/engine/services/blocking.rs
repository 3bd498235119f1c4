//! Propagation of unattainable dependency edges.
//!
//! Both directions walk a worklist instead of recursing, so a deep chain of
//! dependents costs queue entries rather than stack frames.

use crate::engine::{EngineResult, TaskGraphEngine};
use crate::task::domain::{BuildId, Task, TaskId, TaskStatus};
use mockable::Clock;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Marks edges onto a finished task unattainable where its status does
    /// not meet the requirement, then blocks everything downstream of each
    /// newly blocked dependent.
    ///
    /// A blocked task never finishes, so every edge onto it is unattainable
    /// whatever it requires. Returns the builds of every dependent whose
    /// edge changed, so their blocked state can be re-derived.
    ///
    /// # Errors
    ///
    /// Returns the first store failure; propagation stops there.
    pub async fn update_blocked_dependencies(
        &self,
        task: &Task,
    ) -> EngineResult<BTreeSet<BuildId>> {
        let mut touched = BTreeSet::new();
        let mut pending: VecDeque<(TaskId, Option<TaskStatus>)> =
            VecDeque::from([(task.id().clone(), Some(task.status()))]);

        while let Some((blocker, status)) = pending.pop_front() {
            for mut dependent in self.stores.tasks.find_dependents(&blocker).await? {
                let Some(edge) = dependent.dependency_on(&blocker) else {
                    continue;
                };
                if edge.unattainable {
                    continue;
                }
                if status.is_some_and(|finished| edge.status.is_satisfied_by(finished)) {
                    continue;
                }
                dependent.mark_dependency_unattainable(&blocker, true);
                self.stores.tasks.update(&dependent).await?;
                touched.insert(dependent.build_id().clone());
                debug!(
                    task_id = %dependent.id(),
                    dependency_id = %blocker,
                    "marked dependency unattainable"
                );
                if dependent.blocked() {
                    pending.push_back((dependent.id().clone(), None));
                }
            }
        }
        Ok(touched)
    }

    /// Clears unattainable edges onto a task that is about to run again,
    /// continuing into every dependent that is unfinished and no longer
    /// blocked by another edge. Returns the builds of every dependent whose
    /// edge changed.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub async fn update_unblocked_dependencies(
        &self,
        task: &Task,
    ) -> EngineResult<BTreeSet<BuildId>> {
        let mut touched = BTreeSet::new();
        let mut pending = VecDeque::from([task.id().clone()]);

        while let Some(unblocker) = pending.pop_front() {
            for mut dependent in self.stores.tasks.find_dependents(&unblocker).await? {
                if !dependent.mark_dependency_unattainable(&unblocker, false) {
                    continue;
                }
                self.stores.tasks.update(&dependent).await?;
                touched.insert(dependent.build_id().clone());
                debug!(
                    task_id = %dependent.id(),
                    dependency_id = %unblocker,
                    "cleared unattainable dependency"
                );
                if !dependent.is_finished() && !dependent.blocked() {
                    pending.push_back(dependent.id().clone());
                }
            }
        }
        Ok(touched)
    }

    /// Updates the cached `finished` flag on every edge onto `task`.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub async fn mark_dependents_finished(&self, task: &Task, finished: bool) -> EngineResult<()> {
        for mut dependent in self.stores.tasks.find_dependents(task.id()).await? {
            if dependent.mark_dependency_finished(task.id(), finished) {
                self.stores.tasks.update(&dependent).await?;
            }
        }
        Ok(())
    }
}
