//! Error types for resolved version definitions.

use thiserror::Error;

/// Errors found while materialising a version definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDefinitionError {
    /// The same task appears twice in a build variant.
    #[error("task '{task}' is defined twice in variant '{variant}'")]
    DuplicateTask {
        /// Build variant name.
        variant: String,
        /// Task name.
        task: String,
    },

    /// A dependency names a task that is not part of the version.
    #[error("task '{task}' in '{variant}' depends on unknown task '{target}' in '{target_variant}'")]
    UnknownDependency {
        /// Build variant of the dependent.
        variant: String,
        /// Dependent task name.
        task: String,
        /// Build variant of the missing target.
        target_variant: String,
        /// Missing target task name.
        target: String,
    },

    /// A display or group definition names a task the variant does not have.
    #[error("'{owner}' in variant '{variant}' references unknown task '{task}'")]
    UnknownMember {
        /// Build variant name.
        variant: String,
        /// Display task or task group name.
        owner: String,
        /// Missing task name.
        task: String,
    },
}
