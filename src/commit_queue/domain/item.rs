//! Queued merge requests.

use crate::task::domain::VersionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A module revision merged alongside the main change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Module name from the project definition.
    pub module: String,
    /// Issue carrying the module change.
    pub issue: String,
}

/// How an item entered the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// A pull request comment.
    PullRequest,
    /// A CLI diff submission.
    Diff,
}

/// A queued merge request.
///
/// An item without a version is unprocessed. Assigning the merge-test
/// version moves it into processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitQueueItem {
    issue: String,
    patch_id: Option<VersionId>,
    version: Option<VersionId>,
    enqueue_time: Option<DateTime<Utc>>,
    processing_start_time: Option<DateTime<Utc>>,
    modules: Vec<Module>,
    message_override: Option<String>,
    source: ItemSource,
}

impl CommitQueueItem {
    /// Creates an unprocessed item.
    #[must_use]
    pub fn new(issue: impl Into<String>, source: ItemSource) -> Self {
        Self {
            issue: issue.into(),
            patch_id: None,
            version: None,
            enqueue_time: None,
            processing_start_time: None,
            modules: Vec::new(),
            message_override: None,
            source,
        }
    }

    /// Sets the patch the item merges.
    #[must_use]
    pub fn with_patch(mut self, patch_id: VersionId) -> Self {
        self.patch_id = Some(patch_id);
        self
    }

    /// Sets module overrides.
    #[must_use]
    pub fn with_modules(mut self, modules: impl IntoIterator<Item = Module>) -> Self {
        self.modules = modules.into_iter().collect();
        self
    }

    /// Sets the commit message override.
    #[must_use]
    pub fn with_message_override(mut self, message: impl Into<String>) -> Self {
        self.message_override = Some(message.into());
        self
    }

    /// Returns the issue identifier.
    #[must_use]
    pub fn issue(&self) -> &str {
        &self.issue
    }

    /// Returns the patch identifier.
    #[must_use]
    pub const fn patch_id(&self) -> Option<&VersionId> {
        self.patch_id.as_ref()
    }

    /// Returns the merge-test version, once processing.
    #[must_use]
    pub const fn version(&self) -> Option<&VersionId> {
        self.version.as_ref()
    }

    /// Returns when the item was queued.
    #[must_use]
    pub const fn enqueue_time(&self) -> Option<DateTime<Utc>> {
        self.enqueue_time
    }

    /// Returns when processing started.
    #[must_use]
    pub const fn processing_start_time(&self) -> Option<DateTime<Utc>> {
        self.processing_start_time
    }

    /// Returns module overrides.
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Returns the commit message override.
    #[must_use]
    pub fn message_override(&self) -> Option<&str> {
        self.message_override.as_deref()
    }

    /// Returns how the item entered the queue.
    #[must_use]
    pub const fn source(&self) -> ItemSource {
        self.source
    }

    /// Returns `true` once a merge-test version is assigned.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.version.is_some()
    }

    /// Returns `true` when `id` names this item by issue, version or patch.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        self.issue == id
            || self.version.as_ref().is_some_and(|version| version.as_str() == id)
            || self.patch_id.as_ref().is_some_and(|patch| patch.as_str() == id)
    }

    pub(crate) const fn stamp_enqueued(&mut self, at: DateTime<Utc>) {
        self.enqueue_time = Some(at);
    }

    pub(crate) fn start_processing(&mut self, version: VersionId, at: DateTime<Utc>) {
        self.version = Some(version);
        self.processing_start_time = Some(at);
    }
}
