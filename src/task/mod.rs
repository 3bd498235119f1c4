//! Task documents and their persistence contract.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//!
//! Orchestration across tasks, builds and versions lives in
//! [`crate::engine`].

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
