//! Error types for scene loading and traversal.

use thiserror::Error;

/// Errors raised before a traversal starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraversalError {
    /// The root entity is not a group.
    #[error("entity {entity} is not a group")]
    NotAGroup {
        /// Label of the offending entity.
        entity: String,
    },

    /// The root entity was deleted from its document.
    #[error("entity {entity} is deleted")]
    Destroyed {
        /// Label of the offending entity.
        entity: String,
    },
}

/// Errors that can occur while loading a scene document.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The document is not valid JSON or does not match the schema.
    #[error("invalid scene document: {0}")]
    Json(#[from] serde_json::Error),
}
