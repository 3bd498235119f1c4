//! Unit tests for the rollup context.
