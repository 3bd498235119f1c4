//! In-memory adapter implementations for tests and embedding.

mod task;

pub use task::InMemoryTaskRepository;
