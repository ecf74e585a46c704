//! Error types for collision shape derivation.

use rigidcad_scene::TraversalError;
use thiserror::Error;

/// Validation failures raised while deriving or realizing a collision shape.
///
/// All of them are scoped to the one requested shape: the scene and the
/// engine are left as they were.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// Entity is deleted or is not a group.
    #[error("entity {entity} is invalid: {reason}")]
    InvalidEntity {
        /// Label of the offending entity.
        entity: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Entity transform has non-perpendicular axes.
    #[error("entity {entity} has a non-uniform (sheared) transform")]
    NonUniformTransform {
        /// Label of the offending entity.
        entity: String,
    },

    /// One or more transform axes are scaled down to nothing.
    #[error("entity {entity} has a zero-scaled axis (scale {scale:?})")]
    DegenerateScale {
        /// Label of the offending entity.
        entity: String,
        /// Per-axis scale factors.
        scale: [f64; 3],
    },

    /// Bounding box has an extent at or below tolerance.
    #[error("entity {entity} has a flat bounding box (extents {extents:?})")]
    FlatGeometry {
        /// Label of the offending entity.
        entity: String,
        /// Width, height and depth of the box.
        extents: [f64; 3],
    },

    /// Too few vertices or faces for the requested shape.
    #[error("entity {entity} has too few {what}: need at least {required}, found {found}")]
    InsufficientGeometry {
        /// Label of the offending entity.
        entity: String,
        /// What was counted ("points", "faces").
        what: &'static str,
        /// Minimum count.
        required: usize,
        /// Actual count.
        found: usize,
    },

    /// All candidate points lie on one plane.
    #[error("entity {entity} has all of its points on one plane")]
    CoplanarGeometry {
        /// Label of the offending entity.
        entity: String,
    },

    /// Compound construction found no usable sub-group.
    #[error("entity {entity} has no valid sub-collisions")]
    NoValidSubshapes {
        /// Label of the offending entity.
        entity: String,
    },

    /// Shape kind name not recognized.
    #[error("unknown shape kind: {0}")]
    UnknownShapeKind(String),

    /// The engine refused to build a shape.
    #[error("engine error: {0}")]
    Engine(String),

    /// Settings are out of range or could not be parsed.
    #[error("invalid settings: {0}")]
    Settings(String),

    /// Traversal precondition failed.
    #[error(transparent)]
    Traversal(#[from] TraversalError),
}

/// Result type for collision operations.
pub type Result<T> = std::result::Result<T, CollisionError>;
