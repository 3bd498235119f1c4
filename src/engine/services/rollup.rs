//! Persisting derived build, version and patch status.

use crate::engine::{EngineResult, TaskGraphEngine};
use crate::reporting::domain::{ExternalStatus, StatusReport};
use crate::rollup::domain::{
    Build, BuildSnapshot, BuildStatus, PatchStatus, Version, VersionStatus, derive,
};
use crate::task::domain::{BuildId, Task, VersionId};
use mockable::Clock;
use std::collections::BTreeSet;
use tracing::info;

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Re-derives the status of a task's build, and of its version and
    /// patch when the build changed.
    ///
    /// The build's `all_tasks_blocked` flag is persisted even when its
    /// status stays the same. Version and patch are left alone when the
    /// build changed neither status, blocked state nor GitHub check status.
    ///
    /// # Errors
    ///
    /// Returns an error when a document is missing or a store fails.
    pub async fn update_build_and_version_status_for_task(&self, task: &Task) -> EngineResult<()> {
        let mut build = self.fetch_build(task.build_id()).await?;
        if !self.update_build_status(&mut build).await? {
            return Ok(());
        }
        self.update_version_and_patch_status(task.version_id()).await
    }

    /// Batch form of [`Self::update_build_and_version_status_for_task`] for
    /// use after bulk changes. Each affected version is recomputed once.
    ///
    /// # Errors
    ///
    /// Returns an error when a document is missing or a store fails.
    pub async fn update_version_and_patch_status_for_builds(
        &self,
        build_ids: &[BuildId],
    ) -> EngineResult<()> {
        let mut versions = BTreeSet::new();
        for mut build in self.stores.builds.find_by_ids(build_ids).await? {
            if self.update_build_status(&mut build).await? {
                versions.insert(build.version_id().clone());
            }
        }
        for version_id in &versions {
            self.update_version_and_patch_status(version_id).await?;
        }
        Ok(())
    }

    /// Re-derives the builds in `touched` other than `own`, which the caller
    /// has already rolled up.
    pub(crate) async fn update_dependent_builds(
        &self,
        own: &BuildId,
        touched: BTreeSet<BuildId>,
    ) -> EngineResult<()> {
        let others: Vec<BuildId> = touched.into_iter().filter(|id| id != own).collect();
        if others.is_empty() {
            return Ok(());
        }
        self.update_version_and_patch_status_for_builds(&others)
            .await
    }

    /// Returns `true` when the build's status, blocked state or GitHub check
    /// status changed.
    async fn update_build_status(&self, build: &mut Build) -> EngineResult<bool> {
        let tasks = self.stores.tasks.find_by_build(build.id()).await?;
        let (status, all_blocked) = derive::build_status(&tasks);
        let blocked_changed = build.set_all_tasks_blocked(all_blocked);
        let github_status = github_build_status(&tasks);
        let github_changed =
            github_status.is_some_and(|github| build.set_github_check_status(github));

        if status == build.status() {
            if blocked_changed || github_changed {
                self.stores.builds.update(build).await?;
            }
            self.report_build_github_status(build, github_changed).await;
            return Ok(blocked_changed || github_changed);
        }

        build.set_aborted(derive::build_aborted(&tasks));
        build.set_status(status, self.clock.utc());
        self.stores.builds.update(build).await?;
        info!(
            build_id = %build.id(),
            status = %status,
            aborted = build.aborted(),
            "build status changed"
        );
        self.report_build_github_status(build, github_changed).await;
        Ok(true)
    }

    async fn update_version_and_patch_status(&self, version_id: &VersionId) -> EngineResult<()> {
        let mut version = self.fetch_version(version_id).await?;
        let builds = self.stores.builds.find_by_version(version_id).await?;
        let status = self.update_version_status(&mut version, &builds).await?;

        if version.requester().is_patch() {
            let mut patch = self.fetch_patch(version_id).await?;
            let patch_status = PatchStatus::from(status);
            if patch.set_status(patch_status, self.clock.utc()) {
                self.stores.patches.update(&patch).await?;
                info!(patch_id = %patch.id(), status = %patch_status, "patch status changed");
            }
        }
        Ok(())
    }

    async fn update_version_status(
        &self,
        version: &mut Version,
        builds: &[Build],
    ) -> EngineResult<VersionStatus> {
        let github_builds: Vec<BuildSnapshot> =
            builds.iter().filter_map(Build::github_snapshot).collect();
        let github_changed = !github_builds.is_empty()
            && version.set_github_check_status(derive::version_status(&github_builds));

        let snapshots: Vec<BuildSnapshot> = builds.iter().map(Build::snapshot).collect();
        let status = derive::version_status(&snapshots);
        let status_changed = status != version.status();
        if status_changed {
            version.set_aborted(derive::version_aborted(&snapshots));
            version.set_status(status, self.clock.utc());
            info!(
                version_id = %version.id(),
                status = %status,
                aborted = version.aborted(),
                "version status changed"
            );
        }
        if status_changed || github_changed {
            self.stores.versions.update(version).await?;
        }

        if github_changed
            && let Some(github_status) = version
                .github_check_status()
                .filter(|github| github.is_finished())
        {
            self.report(StatusReport::new(
                version.id().clone(),
                ExternalStatus::from(github_status),
                format!("version finished with status '{github_status}'"),
            ))
            .await;
        }
        Ok(status)
    }

    async fn report_build_github_status(&self, build: &Build, changed: bool) {
        let Some(status) = build.github_check_status().filter(|_| changed) else {
            return;
        };
        if !status.is_finished() {
            return;
        }
        self.report(StatusReport::new(
            build.version_id().clone(),
            ExternalStatus::from(status),
            format!(
                "build '{}' finished with status '{status}'",
                build.build_variant()
            ),
        ))
        .await;
    }
}

fn github_build_status(tasks: &[Task]) -> Option<BuildStatus> {
    let github_tasks: Vec<Task> = tasks
        .iter()
        .filter(|task| task.is_github_check())
        .cloned()
        .collect();
    if github_tasks.is_empty() {
        return None;
    }
    Some(derive::build_status(&github_tasks).0)
}
