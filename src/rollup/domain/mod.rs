//! Domain model for aggregate documents.

mod build;
pub mod derive;
mod status;
mod version;

pub use build::{Build, BuildSnapshot};
pub use status::{BuildStatus, PatchStatus, VersionStatus};
pub use version::{Patch, Version};
