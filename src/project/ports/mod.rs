//! Port contracts for project configuration lookups.

pub mod policy;

pub use policy::{ProjectPolicyError, ProjectPolicyProvider, ProjectPolicyResult};

#[cfg(test)]
pub use policy::MockProjectPolicyProvider;
