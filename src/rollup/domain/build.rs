//! Build documents.

use super::BuildStatus;
use crate::task::domain::{BuildId, VersionId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// All tasks sharing a version and build variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    id: BuildId,
    version_id: VersionId,
    build_variant: String,
    status: BuildStatus,
    activated: bool,
    activated_time: Option<DateTime<Utc>>,
    aborted: bool,
    all_tasks_blocked: bool,
    is_github_check: bool,
    github_check_status: Option<BuildStatus>,
    create_time: DateTime<Utc>,
    start_time: Option<DateTime<Utc>>,
    finish_time: Option<DateTime<Utc>>,
}

/// The fields version status is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSnapshot {
    /// Build status, or GitHub-check status for the check subset.
    pub status: BuildStatus,
    /// Whether the build is activated.
    pub activated: bool,
    /// Whether the build was aborted cleanly.
    pub aborted: bool,
    /// Whether every task in the build is blocked.
    pub all_tasks_blocked: bool,
}

impl Build {
    /// Creates a build in `created` status.
    #[must_use]
    pub fn new(
        version_id: VersionId,
        build_variant: impl Into<String>,
        activated: bool,
        clock: &impl Clock,
    ) -> Self {
        let variant: String = build_variant.into();
        let now = clock.utc();
        Self {
            id: BuildId::for_variant(&version_id, &variant),
            version_id,
            build_variant: variant,
            status: BuildStatus::Created,
            activated,
            activated_time: activated.then_some(now),
            aborted: false,
            all_tasks_blocked: false,
            is_github_check: false,
            github_check_status: None,
            create_time: now,
            start_time: None,
            finish_time: None,
        }
    }

    /// Includes the build in the GitHub check status subset.
    #[must_use]
    pub const fn with_github_check(mut self) -> Self {
        self.is_github_check = true;
        self
    }

    /// Returns the build identifier.
    #[must_use]
    pub const fn id(&self) -> &BuildId {
        &self.id
    }

    /// Returns the owning version.
    #[must_use]
    pub const fn version_id(&self) -> &VersionId {
        &self.version_id
    }

    /// Returns the build variant name.
    #[must_use]
    pub fn build_variant(&self) -> &str {
        &self.build_variant
    }

    /// Returns the derived status.
    #[must_use]
    pub const fn status(&self) -> BuildStatus {
        self.status
    }

    /// Returns `true` when the build is activated.
    #[must_use]
    pub const fn activated(&self) -> bool {
        self.activated
    }

    /// Returns when the build was activated.
    #[must_use]
    pub const fn activated_time(&self) -> Option<DateTime<Utc>> {
        self.activated_time
    }

    /// Returns `true` when the build was cancelled without failures.
    #[must_use]
    pub const fn aborted(&self) -> bool {
        self.aborted
    }

    /// Returns `true` when every task in the build is blocked.
    #[must_use]
    pub const fn all_tasks_blocked(&self) -> bool {
        self.all_tasks_blocked
    }

    /// Returns `true` when the build takes part in the GitHub check.
    #[must_use]
    pub const fn is_github_check(&self) -> bool {
        self.is_github_check
    }

    /// Returns the status of the GitHub check task subset.
    #[must_use]
    pub const fn github_check_status(&self) -> Option<BuildStatus> {
        self.github_check_status
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    /// Returns when the build started.
    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Returns when the build finished.
    #[must_use]
    pub const fn finish_time(&self) -> Option<DateTime<Utc>> {
        self.finish_time
    }

    /// Returns the fields version status derives from.
    #[must_use]
    pub const fn snapshot(&self) -> BuildSnapshot {
        BuildSnapshot {
            status: self.status,
            activated: self.activated,
            aborted: self.aborted,
            all_tasks_blocked: self.all_tasks_blocked,
        }
    }

    /// Returns the GitHub-check view of the build, when it takes part.
    #[must_use]
    pub fn github_snapshot(&self) -> Option<BuildSnapshot> {
        self.is_github_check.then(|| BuildSnapshot {
            status: self.github_check_status.unwrap_or_default(),
            ..self.snapshot()
        })
    }

    /// Moves a `created` build to `started`.
    ///
    /// Returns `true` when the status changed.
    pub fn mark_started(&mut self, at: DateTime<Utc>) -> bool {
        if self.status != BuildStatus::Created {
            return false;
        }
        self.status = BuildStatus::Started;
        self.start_time = Some(at);
        true
    }

    /// Records a newly derived status, stamping finish time on terminal
    /// statuses.
    pub fn set_status(&mut self, status: BuildStatus, at: DateTime<Utc>) {
        self.status = status;
        if status.is_finished() {
            self.finish_time = Some(at);
        } else {
            self.finish_time = None;
            if status == BuildStatus::Started && self.start_time.is_none() {
                self.start_time = Some(at);
            }
        }
    }

    /// Records whether every task is blocked. Returns `true` on change.
    pub fn set_all_tasks_blocked(&mut self, blocked: bool) -> bool {
        let changed = self.all_tasks_blocked != blocked;
        self.all_tasks_blocked = blocked;
        changed
    }

    /// Records the aborted flag.
    pub const fn set_aborted(&mut self, aborted: bool) {
        self.aborted = aborted;
    }

    /// Records the activation flag.
    pub fn set_activated(&mut self, activated: bool, at: DateTime<Utc>) {
        if activated && !self.activated {
            self.activated_time = Some(at);
        }
        self.activated = activated;
    }

    /// Records the GitHub check subset status. Returns `true` on change.
    pub fn set_github_check_status(&mut self, status: BuildStatus) -> bool {
        let changed = self.github_check_status != Some(status);
        self.github_check_status = Some(status);
        changed
    }
}
