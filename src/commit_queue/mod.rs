//! The per-project merge queue.
//!
//! Queue ordering rules live on the [`domain::CommitQueue`] document. The
//! merge-task chain between processing items and the reactions to a failing
//! merge live in [`crate::engine`], since they touch tasks.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
