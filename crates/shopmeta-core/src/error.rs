//! Error types for shopmeta-core

use thiserror::Error;

use crate::models::{EntityId, EntityKind};

/// Result type alias using shopmeta-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shopmeta-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API answered with a failure status
    #[error("Remote API error: {0}")]
    Api(String),

    /// Entity not found on the remote store
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of the missing entity
        kind: EntityKind,
        /// Identifier that was looked up
        id: EntityId,
    },

    /// Update call returned without a confirmed entity
    #[error("Update of {kind} {id} did not return the updated entity")]
    MissingEntity {
        /// Kind of the updated entity
        kind: EntityKind,
        /// Identifier of the updated entity
        id: EntityId,
    },

    /// Remote state moved since it was last read
    #[error("Conflicting update on {kind} {id}: {reason}")]
    Conflict {
        /// Kind of the contended entity
        kind: EntityKind,
        /// Identifier of the contended entity
        id: EntityId,
        /// What changed underneath us
        reason: String,
    },

    /// Synchronizer used before `load`
    #[error("Metadata field '{0}' has not been loaded")]
    NotLoaded(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether retrying from a fresh read could succeed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
