//! In-memory adapter implementations for tests and embedding.

mod build;
mod version;

pub use build::InMemoryBuildRepository;
pub use version::{InMemoryPatchRepository, InMemoryVersionRepository};

use crate::rollup::ports::RollupRepositoryError;

fn lock_error(err: &impl ToString) -> RollupRepositoryError {
    RollupRepositoryError::persistence(std::io::Error::other(err.to_string()))
}
