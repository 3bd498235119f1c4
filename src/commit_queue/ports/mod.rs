//! Port contracts for commit queue persistence.

pub mod repository;

pub use repository::{CommitQueueRepository, CommitQueueRepositoryError, CommitQueueRepositoryResult};
