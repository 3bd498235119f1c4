//! In-memory adapter implementations for tests and embedding.

mod queue;

pub use queue::InMemoryCommitQueueRepository;
