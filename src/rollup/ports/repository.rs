//! Repository ports for builds, versions and patches.

use crate::rollup::domain::{Build, Patch, Version};
use crate::task::domain::{BuildId, VersionId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for aggregate repository operations.
pub type RollupRepositoryResult<T> = Result<T, RollupRepositoryError>;

/// Build persistence contract.
#[async_trait]
pub trait BuildRepository: Send + Sync {
    /// Stores a new build.
    ///
    /// # Errors
    ///
    /// Returns [`RollupRepositoryError::Duplicate`] when the build exists.
    async fn store(&self, build: &Build) -> RollupRepositoryResult<()>;

    /// Replaces an existing build.
    ///
    /// # Errors
    ///
    /// Returns [`RollupRepositoryError::NotFound`] when the build does not
    /// exist.
    async fn update(&self, build: &Build) -> RollupRepositoryResult<()>;

    /// Finds a build by identifier.
    async fn find_by_id(&self, id: &BuildId) -> RollupRepositoryResult<Option<Build>>;

    /// Finds every build in `ids` that exists.
    async fn find_by_ids(&self, ids: &[BuildId]) -> RollupRepositoryResult<Vec<Build>>;

    /// Returns every build in a version.
    async fn find_by_version(&self, version_id: &VersionId) -> RollupRepositoryResult<Vec<Build>>;
}

/// Version persistence contract.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Stores a new version.
    ///
    /// # Errors
    ///
    /// Returns [`RollupRepositoryError::Duplicate`] when the version exists.
    async fn store(&self, version: &Version) -> RollupRepositoryResult<()>;

    /// Replaces an existing version.
    ///
    /// # Errors
    ///
    /// Returns [`RollupRepositoryError::NotFound`] when the version does not
    /// exist.
    async fn update(&self, version: &Version) -> RollupRepositoryResult<()>;

    /// Finds a version by identifier.
    async fn find_by_id(&self, id: &VersionId) -> RollupRepositoryResult<Option<Version>>;
}

/// Patch persistence contract.
#[async_trait]
pub trait PatchRepository: Send + Sync {
    /// Stores a new patch.
    ///
    /// # Errors
    ///
    /// Returns [`RollupRepositoryError::Duplicate`] when the patch exists.
    async fn store(&self, patch: &Patch) -> RollupRepositoryResult<()>;

    /// Replaces an existing patch.
    ///
    /// # Errors
    ///
    /// Returns [`RollupRepositoryError::NotFound`] when the patch does not
    /// exist.
    async fn update(&self, patch: &Patch) -> RollupRepositoryResult<()>;

    /// Finds a patch by its version identifier.
    async fn find_by_id(&self, id: &VersionId) -> RollupRepositoryResult<Option<Patch>>;
}

/// Errors returned by aggregate repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RollupRepositoryError {
    /// A document with the same identifier already exists.
    #[error("duplicate {kind} identifier: {id}")]
    Duplicate {
        /// Document kind.
        kind: &'static str,
        /// Conflicting identifier.
        id: String,
    },

    /// The document was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Document kind.
        kind: &'static str,
        /// Missing identifier.
        id: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RollupRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    pub(crate) fn duplicate(kind: &'static str, id: impl ToString) -> Self {
        Self::Duplicate {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
