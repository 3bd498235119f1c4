//! Stepback and deactivate-previous policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scheduling policy resolved from a project's configuration.
///
/// Stepback resolves from the most specific setting: task, then build
/// variant, then project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPolicy {
    /// Project-wide stepback default.
    #[serde(default)]
    pub stepback: bool,
    /// Whether a newer green run deactivates older queued runs.
    #[serde(default)]
    pub deactivate_previous: bool,
    /// Per build variant stepback overrides.
    #[serde(default)]
    pub variant_stepback: BTreeMap<String, bool>,
    /// Per task stepback overrides, keyed by display name.
    #[serde(default)]
    pub task_stepback: BTreeMap<String, bool>,
}

impl ProjectPolicy {
    /// Creates a policy with stepback on or off project-wide.
    #[must_use]
    pub fn with_stepback(stepback: bool) -> Self {
        Self {
            stepback,
            ..Self::default()
        }
    }

    /// Enables deactivating older queued runs on success.
    #[must_use]
    pub const fn deactivating_previous(mut self) -> Self {
        self.deactivate_previous = true;
        self
    }

    /// Overrides stepback for a build variant.
    #[must_use]
    pub fn with_variant_stepback(mut self, variant: impl Into<String>, enabled: bool) -> Self {
        self.variant_stepback.insert(variant.into(), enabled);
        self
    }

    /// Overrides stepback for a task.
    #[must_use]
    pub fn with_task_stepback(mut self, task: impl Into<String>, enabled: bool) -> Self {
        self.task_stepback.insert(task.into(), enabled);
        self
    }

    /// Returns whether stepback applies to `task` on `variant`.
    #[must_use]
    pub fn stepback_enabled(&self, variant: &str, task: &str) -> bool {
        self.task_stepback
            .get(task)
            .or_else(|| self.variant_stepback.get(variant))
            .copied()
            .unwrap_or(self.stepback)
    }
}
