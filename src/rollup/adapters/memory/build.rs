//! In-memory build repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::lock_error;
use crate::rollup::{
    domain::Build,
    ports::{BuildRepository, RollupRepositoryError, RollupRepositoryResult},
};
use crate::task::domain::{BuildId, VersionId};

/// Thread-safe in-memory build repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBuildRepository {
    builds: Arc<RwLock<HashMap<BuildId, Build>>>,
}

impl InMemoryBuildRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BuildRepository for InMemoryBuildRepository {
    async fn store(&self, build: &Build) -> RollupRepositoryResult<()> {
        let mut builds = self.builds.write().map_err(|err| lock_error(&err))?;
        if builds.contains_key(build.id()) {
            return Err(RollupRepositoryError::duplicate("build", build.id()));
        }
        builds.insert(build.id().clone(), build.clone());
        Ok(())
    }

    async fn update(&self, build: &Build) -> RollupRepositoryResult<()> {
        let mut builds = self.builds.write().map_err(|err| lock_error(&err))?;
        let stored = builds
            .get_mut(build.id())
            .ok_or_else(|| RollupRepositoryError::not_found("build", build.id()))?;
        *stored = build.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &BuildId) -> RollupRepositoryResult<Option<Build>> {
        let builds = self.builds.read().map_err(|err| lock_error(&err))?;
        Ok(builds.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[BuildId]) -> RollupRepositoryResult<Vec<Build>> {
        let builds = self.builds.read().map_err(|err| lock_error(&err))?;
        Ok(ids.iter().filter_map(|id| builds.get(id).cloned()).collect())
    }

    async fn find_by_version(&self, version_id: &VersionId) -> RollupRepositoryResult<Vec<Build>> {
        let builds = self.builds.read().map_err(|err| lock_error(&err))?;
        let mut found: Vec<Build> = builds
            .values()
            .filter(|build| build.version_id() == version_id)
            .cloned()
            .collect();
        found.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(found)
    }
}
