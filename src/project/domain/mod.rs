//! Domain model for resolved project configuration.

mod definition;
mod error;
mod policy;

pub use definition::{
    DisplayTaskDefinition, EdgeDefinition, TaskGroupDefinition, TaskUnitDefinition,
    VariantDefinition, VersionDefinition,
};
pub use error::ProjectDefinitionError;
pub use policy::ProjectPolicy;
