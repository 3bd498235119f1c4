//! Adapters for the rollup context.

pub mod memory;
