//! In-memory policy provider.

mod policy;

pub use policy::StaticProjectPolicyProvider;
