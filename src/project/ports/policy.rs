//! Policy provider port.

use crate::project::domain::ProjectPolicy;
use crate::task::domain::{ProjectId, VersionId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for policy lookups.
pub type ProjectPolicyResult<T> = Result<T, ProjectPolicyError>;

/// Supplies the policy in force for a version of a project.
///
/// The version is passed so providers can answer with the configuration the
/// version was created from rather than the project's latest.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectPolicyProvider: Send + Sync {
    /// Returns the policy for `version_id` of `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectPolicyError::NotFound`] when the project is unknown.
    async fn policy(
        &self,
        project_id: &ProjectId,
        version_id: &VersionId,
    ) -> ProjectPolicyResult<ProjectPolicy>;
}

/// Errors returned by policy providers.
#[derive(Debug, Clone, Error)]
pub enum ProjectPolicyError {
    /// The project has no configuration.
    #[error("project not found: {0}")]
    NotFound(ProjectId),

    /// The provider failed.
    #[error("project provider error: {0}")]
    Provider(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProjectPolicyError {
    /// Wraps a provider error.
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(err))
    }
}
