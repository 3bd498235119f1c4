//! In-memory version and patch repositories.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::lock_error;
use crate::rollup::{
    domain::{Patch, Version},
    ports::{PatchRepository, RollupRepositoryError, RollupRepositoryResult, VersionRepository},
};
use crate::task::domain::VersionId;

/// Thread-safe in-memory version repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVersionRepository {
    versions: Arc<RwLock<HashMap<VersionId, Version>>>,
}

impl InMemoryVersionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionRepository for InMemoryVersionRepository {
    async fn store(&self, version: &Version) -> RollupRepositoryResult<()> {
        let mut versions = self.versions.write().map_err(|err| lock_error(&err))?;
        if versions.contains_key(version.id()) {
            return Err(RollupRepositoryError::duplicate("version", version.id()));
        }
        versions.insert(version.id().clone(), version.clone());
        Ok(())
    }

    async fn update(&self, version: &Version) -> RollupRepositoryResult<()> {
        let mut versions = self.versions.write().map_err(|err| lock_error(&err))?;
        let stored = versions
            .get_mut(version.id())
            .ok_or_else(|| RollupRepositoryError::not_found("version", version.id()))?;
        *stored = version.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &VersionId) -> RollupRepositoryResult<Option<Version>> {
        let versions = self.versions.read().map_err(|err| lock_error(&err))?;
        Ok(versions.get(id).cloned())
    }
}

/// Thread-safe in-memory patch repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPatchRepository {
    patches: Arc<RwLock<HashMap<VersionId, Patch>>>,
}

impl InMemoryPatchRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatchRepository for InMemoryPatchRepository {
    async fn store(&self, patch: &Patch) -> RollupRepositoryResult<()> {
        let mut patches = self.patches.write().map_err(|err| lock_error(&err))?;
        if patches.contains_key(patch.id()) {
            return Err(RollupRepositoryError::duplicate("patch", patch.id()));
        }
        patches.insert(patch.id().clone(), patch.clone());
        Ok(())
    }

    async fn update(&self, patch: &Patch) -> RollupRepositoryResult<()> {
        let mut patches = self.patches.write().map_err(|err| lock_error(&err))?;
        let stored = patches
            .get_mut(patch.id())
            .ok_or_else(|| RollupRepositoryError::not_found("patch", patch.id()))?;
        *stored = patch.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &VersionId) -> RollupRepositoryResult<Option<Patch>> {
        let patches = self.patches.read().map_err(|err| lock_error(&err))?;
        Ok(patches.get(id).cloned())
    }
}
