#![warn(missing_docs)]

//! Collision shape derivation for rigidcad scenes.
//!
//! A group entity is turned into a collision shape in two steps:
//! [`build_descriptor`] validates the group and reduces its geometry to an
//! engine-ready [`ShapeDescriptor`], then [`realize`] hands that descriptor
//! to a [`CollisionEngine`]. [`create`] does both.
//!
//! # Example
//!
//! ```
//! use rigidcad_collision::{create, CollisionSettings, ParryEngine, ShapeKind};
//! use rigidcad_math::{Point3, Transform};
//! use rigidcad_scene::primitives::cuboid;
//!
//! let part = cuboid(1, Point3::origin(), Point3::new(1.0, 2.0, 3.0), Transform::identity());
//! let mut engine = ParryEngine::new();
//! let key = create(&mut engine, &part, ShapeKind::Box, false, &CollisionSettings::default())?;
//! assert!(engine.shape(key).is_some());
//! # Ok::<(), rigidcad_collision::CollisionError>(())
//! ```

mod builder;
mod engine;
mod error;
mod parry;
mod settings;
mod shape;

pub use builder::build_descriptor;
pub use engine::{realize, CollisionEngine, HandleArena};
pub use error::{CollisionError, Result};
pub use parry::{EngineShape, ParryEngine, ShapeKey};
pub use settings::{CollisionSettings, DecompositionParams};
pub use shape::{
    Compound, ConvexDecomposition, ConvexHull, Revolved, ShapeDescriptor, ShapeKind, StaticMesh,
};

use rigidcad_scene::Entity;

/// Derive a collision shape for `entity` and create it in `engine`.
///
/// With `apply_offset`, the shape is placed by the entity's own transform
/// (rotation and origin); otherwise it sits in the entity's local frame with
/// only the transform's scale applied. On error nothing is left allocated in
/// the engine.
pub fn create<E: CollisionEngine>(
    engine: &mut E,
    entity: &Entity,
    kind: ShapeKind,
    apply_offset: bool,
    settings: &CollisionSettings,
) -> Result<E::Handle> {
    let descriptor = build_descriptor(entity, kind, apply_offset, settings)?;
    let handle = realize(engine, &descriptor)?;
    log::info!("created {kind} collision for {}", entity.label());
    Ok(handle)
}
