//! Adapters for the task context.

pub mod memory;
