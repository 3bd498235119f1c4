//! Port contracts for aggregate persistence.

pub mod repository;

pub use repository::{
    BuildRepository, PatchRepository, RollupRepositoryError, RollupRepositoryResult,
    VersionRepository,
};
