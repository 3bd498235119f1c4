//! Step definitions for commit queue BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
