//! Requester classes and the actors that act on tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What caused a version, and therefore its tasks, to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requester {
    /// A mainline commit picked up by the repository tracker.
    Mainline,
    /// A git tag push.
    GitTag,
    /// A user-submitted patch.
    Patch,
    /// A GitHub pull request patch.
    GithubPullRequest,
    /// A commit-queue merge test.
    MergeTest,
}

impl Requester {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainline => "mainline",
            Self::GitTag => "git_tag",
            Self::Patch => "patch",
            Self::GithubPullRequest => "github_pull_request",
            Self::MergeTest => "merge_test",
        }
    }

    /// Returns `true` for requesters that own a patch document.
    #[must_use]
    pub const fn is_patch(self) -> bool {
        matches!(
            self,
            Self::Patch | Self::GithubPullRequest | Self::MergeTest
        )
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who activated, deactivated, reset or aborted a task.
///
/// System activators are automation. A user deactivation is never silently
/// undone by automation, and automation does not deactivate what a user
/// activated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Activator {
    /// A named user acting through the UI or API.
    User(String),
    /// The stepback controller.
    Stepback,
    /// The API server acting on behalf of an agent.
    ApiServer,
    /// The liveness monitor.
    Monitor,
    /// Any other internal job.
    System,
}

impl Activator {
    /// Creates a user activator.
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self::User(name.into())
    }

    /// Returns `true` for automation activators.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        !matches!(self, Self::User(_))
    }
}

impl fmt::Display for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(name) => f.write_str(name),
            Self::Stepback => f.write_str("stepback"),
            Self::ApiServer => f.write_str("apiserver"),
            Self::Monitor => f.write_str("monitor"),
            Self::System => f.write_str("system"),
        }
    }
}

/// Where a reset request entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetOrigin {
    /// The web UI.
    Ui,
    /// The REST API.
    Rest,
    /// The API server, on behalf of an agent.
    ApiServer,
    /// The liveness monitor.
    Monitor,
    /// An internal job.
    System,
}

impl ResetOrigin {
    /// Returns `true` for origins driven directly by a person.
    ///
    /// These may reset past the execution cap but may not reset a task that
    /// is still running.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Ui | Self::Rest)
    }

    /// Returns the activator that acts for a non-interactive origin.
    #[must_use]
    pub const fn activator(self) -> Activator {
        match self {
            Self::Monitor => Activator::Monitor,
            Self::ApiServer => Activator::ApiServer,
            Self::Ui | Self::Rest | Self::System => Activator::System,
        }
    }
}
