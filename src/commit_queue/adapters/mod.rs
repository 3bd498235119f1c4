//! Adapters for the commit queue context.

pub mod memory;
