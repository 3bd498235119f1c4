//! Error types for commit queue ordering rules.

use thiserror::Error;

/// Errors returned by commit queue operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommitQueueDomainError {
    /// The issue, version or patch is already queued.
    #[error("item already in queue")]
    DuplicateItem {
        /// The identifier that matched.
        issue: String,
        /// Position of the existing item.
        position: usize,
    },

    /// No queued item matches the identifier.
    #[error("item '{0}' is not in the queue")]
    ItemNotFound(String),

    /// Processing an item would leave an unprocessed item ahead of it.
    #[error("item '{issue}' cannot start processing ahead of '{blocking}'")]
    OutOfOrderProcessing {
        /// The item asked to start.
        issue: String,
        /// The earlier unprocessed item.
        blocking: String,
    },
}

impl CommitQueueDomainError {
    /// Returns the position of the existing item for duplicate errors.
    #[must_use]
    pub const fn existing_position(&self) -> Option<usize> {
        match self {
            Self::DuplicateItem { position, .. } => Some(*position),
            _ => None,
        }
    }
}
