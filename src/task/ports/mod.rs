//! Port contracts for task persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by the engine.

pub mod repository;

pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
