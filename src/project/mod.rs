//! Resolved project configuration consumed by the engine.
//!
//! Loading and validating project files happens upstream. This context only
//! carries the already-resolved results: stepback policy per task and the
//! task graph of a new version.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
