//! Version and patch documents.

use super::{PatchStatus, VersionStatus};
use crate::task::domain::{ProjectId, Requester, VersionId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// All builds for one commit or patch application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    id: VersionId,
    project_id: ProjectId,
    requester: Requester,
    revision_order_number: u64,
    status: VersionStatus,
    activated: bool,
    aborted: bool,
    github_check_status: Option<VersionStatus>,
    create_time: DateTime<Utc>,
    start_time: Option<DateTime<Utc>>,
    finish_time: Option<DateTime<Utc>>,
}

impl Version {
    /// Creates a version in `created` status.
    #[must_use]
    pub fn new(
        id: VersionId,
        project_id: ProjectId,
        requester: Requester,
        revision_order_number: u64,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            project_id,
            requester,
            revision_order_number,
            status: VersionStatus::Created,
            activated: false,
            aborted: false,
            github_check_status: None,
            create_time: clock.utc(),
            start_time: None,
            finish_time: None,
        }
    }

    /// Returns the version identifier.
    #[must_use]
    pub const fn id(&self) -> &VersionId {
        &self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the requester class.
    #[must_use]
    pub const fn requester(&self) -> Requester {
        self.requester
    }

    /// Returns the project-wide revision order number.
    #[must_use]
    pub const fn revision_order_number(&self) -> u64 {
        self.revision_order_number
    }

    /// Returns the derived status.
    #[must_use]
    pub const fn status(&self) -> VersionStatus {
        self.status
    }

    /// Returns `true` once any task in the version was activated.
    #[must_use]
    pub const fn activated(&self) -> bool {
        self.activated
    }

    /// Returns `true` when some build was aborted cleanly.
    #[must_use]
    pub const fn aborted(&self) -> bool {
        self.aborted
    }

    /// Returns the status of the GitHub check build subset.
    #[must_use]
    pub const fn github_check_status(&self) -> Option<VersionStatus> {
        self.github_check_status
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    /// Returns when the version started.
    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Returns when the version finished.
    #[must_use]
    pub const fn finish_time(&self) -> Option<DateTime<Utc>> {
        self.finish_time
    }

    /// Moves a `created` version to `started`. Returns `true` on change.
    pub fn mark_started(&mut self, at: DateTime<Utc>) -> bool {
        if self.status != VersionStatus::Created {
            return false;
        }
        self.status = VersionStatus::Started;
        self.start_time = Some(at);
        true
    }

    /// Records a newly derived status.
    pub fn set_status(&mut self, status: VersionStatus, at: DateTime<Utc>) {
        self.status = status;
        if status.is_finished() {
            self.finish_time = Some(at);
        } else {
            self.finish_time = None;
            if status == VersionStatus::Started && self.start_time.is_none() {
                self.start_time = Some(at);
            }
        }
    }

    /// Records the aborted flag.
    pub const fn set_aborted(&mut self, aborted: bool) {
        self.aborted = aborted;
    }

    /// Marks the version activated.
    pub const fn set_activated(&mut self, activated: bool) {
        self.activated = activated;
    }

    /// Records the GitHub check subset status. Returns `true` on change.
    pub fn set_github_check_status(&mut self, status: VersionStatus) -> bool {
        let changed = self.github_check_status != Some(status);
        self.github_check_status = Some(status);
        changed
    }
}

/// A patch, sharing its identifier with its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    id: VersionId,
    project_id: ProjectId,
    status: PatchStatus,
    activated: bool,
    is_pr_merge: bool,
    start_time: Option<DateTime<Utc>>,
    finish_time: Option<DateTime<Utc>>,
}

impl Patch {
    /// Creates a patch for `version_id`.
    #[must_use]
    pub const fn new(version_id: VersionId, project_id: ProjectId) -> Self {
        Self {
            id: version_id,
            project_id,
            status: PatchStatus::Created,
            activated: false,
            is_pr_merge: false,
            start_time: None,
            finish_time: None,
        }
    }

    /// Marks the patch as a commit-queue merge of a pull request.
    #[must_use]
    pub const fn as_pr_merge(mut self) -> Self {
        self.is_pr_merge = true;
        self
    }

    /// Returns the patch identifier, equal to its version identifier.
    #[must_use]
    pub const fn id(&self) -> &VersionId {
        &self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the status looked up from the version.
    #[must_use]
    pub const fn status(&self) -> PatchStatus {
        self.status
    }

    /// Returns `true` once the patch was activated.
    #[must_use]
    pub const fn activated(&self) -> bool {
        self.activated
    }

    /// Returns `true` for commit-queue merges of pull requests.
    #[must_use]
    pub const fn is_pr_merge(&self) -> bool {
        self.is_pr_merge
    }

    /// Returns when the patch started.
    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Returns when the patch finished.
    #[must_use]
    pub const fn finish_time(&self) -> Option<DateTime<Utc>> {
        self.finish_time
    }

    /// Moves a `created` patch to `started`. Returns `true` on change.
    pub fn mark_started(&mut self, at: DateTime<Utc>) -> bool {
        if self.status != PatchStatus::Created {
            return false;
        }
        self.status = PatchStatus::Started;
        self.start_time = Some(at);
        true
    }

    /// Records the status looked up from the version. Returns `true` on
    /// change.
    pub fn set_status(&mut self, status: PatchStatus, at: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        if status.is_finished() {
            self.finish_time = Some(at);
        } else if status == PatchStatus::Started && self.start_time.is_none() {
            self.start_time = Some(at);
        }
        true
    }

    /// Records the activation flag.
    pub const fn set_activated(&mut self, activated: bool) {
        self.activated = activated;
    }
}
