//! Outbound status notifications.
//!
//! The engine reports final disposition of versions and builds in the
//! GitHub check subset, and commit-queue failures. Delivery and retry belong
//! to the [`ports::StatusReporter`] implementation.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
