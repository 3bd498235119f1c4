//! Builds, versions and patches, and the status they derive from tasks.
//!
//! - Domain types and pure status derivation in [`domain`]
//! - Port contracts in [`ports`]
//! - In-memory adapters in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
