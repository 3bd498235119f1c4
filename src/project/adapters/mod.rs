//! Adapters for the project context.

pub mod memory;
