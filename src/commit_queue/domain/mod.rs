//! Domain model for commit queues.

mod error;
mod item;
mod queue;

pub use error::CommitQueueDomainError;
pub use item::{CommitQueueItem, ItemSource, Module};
pub use queue::CommitQueue;
