//! Policy provider backed by a fixed map of projects.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::project::{
    domain::ProjectPolicy,
    ports::{ProjectPolicyError, ProjectPolicyProvider, ProjectPolicyResult},
};
use crate::task::domain::{ProjectId, VersionId};

/// Serves one policy per project, whatever the version.
#[derive(Debug, Clone, Default)]
pub struct StaticProjectPolicyProvider {
    policies: Arc<RwLock<HashMap<ProjectId, ProjectPolicy>>>,
}

impl StaticProjectPolicyProvider {
    /// Creates a provider with no projects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider serving `policy` for `project_id`.
    #[must_use]
    pub fn with_project(project_id: ProjectId, policy: ProjectPolicy) -> Self {
        let provider = Self::new();
        provider.set_policy(project_id, policy);
        provider
    }

    /// Sets or replaces the policy of a project.
    ///
    /// A poisoned lock leaves the previous policy in place.
    pub fn set_policy(&self, project_id: ProjectId, policy: ProjectPolicy) {
        if let Ok(mut policies) = self.policies.write() {
            policies.insert(project_id, policy);
        }
    }
}

#[async_trait]
impl ProjectPolicyProvider for StaticProjectPolicyProvider {
    async fn policy(
        &self,
        project_id: &ProjectId,
        _version_id: &VersionId,
    ) -> ProjectPolicyResult<ProjectPolicy> {
        let policies = self.policies.read().map_err(|err| {
            ProjectPolicyError::provider(std::io::Error::other(err.to_string()))
        })?;
        policies
            .get(project_id)
            .cloned()
            .ok_or_else(|| ProjectPolicyError::NotFound(project_id.clone()))
    }
}
