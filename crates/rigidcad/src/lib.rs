#![warn(missing_docs)]

//! rigidcad: collision shapes for rigid-body physics, derived from CAD scenes.
//!
//! The workspace is split by concern and re-exported here:
//!
//! - [`math`]: transforms, bounding boxes and geometric predicates
//! - [`scene`]: the entity tree and the traversals that collect its geometry
//! - [`collision`]: shape descriptors, validation and the parry3d engine
//!
//! # Example
//!
//! ```rust
//! use rigidcad::prelude::*;
//!
//! let mut scene = Scene::new();
//! scene.entities.push(
//!     primitives::cuboid(1, Point3::origin(), Point3::new(2.0, 1.0, 1.0), Transform::identity())
//!         .named("crate"),
//! );
//! let json = scene.to_json().unwrap();
//!
//! let settings = CollisionSettings::default();
//! let shape = rigidcad::collider_from_json(&json, "crate", "box", true, &settings).unwrap();
//! assert!(shape.geometry().is_some());
//! ```

use std::path::Path;

use thiserror::Error;

pub use rigidcad_collision as collision;
pub use rigidcad_math as math;
pub use rigidcad_scene as scene;

use rigidcad_collision::{
    CollisionEngine, CollisionError, CollisionSettings, EngineShape, ParryEngine, ShapeKind,
};
use rigidcad_scene::{Entity, Scene, SceneError};

/// Errors returned by the one-call helpers.
#[derive(Error, Debug)]
pub enum RigidcadError {
    /// An I/O error occurred while reading input.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The scene document could not be parsed.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// No entity matched the lookup key.
    #[error("no entity matches {0:?}")]
    EntityNotFound(String),
    /// Shape derivation or creation failed.
    #[error(transparent)]
    Collision(#[from] CollisionError),
}

/// Commonly used types.
pub mod prelude {
    pub use rigidcad_collision::{
        create, CollisionEngine, CollisionError, CollisionSettings, ParryEngine, ShapeDescriptor,
        ShapeKind,
    };
    pub use rigidcad_math::{BoundingBox, Point3, Transform, Vec3, EPSILON};
    pub use rigidcad_scene::{primitives, Entity, Scene, Traversal};
}

/// Look up an entity by name, by `#id`, or by bare numeric id.
///
/// Names take precedence over ids.
pub fn find_entity<'a>(scene: &'a Scene, key: &str) -> Option<&'a Entity> {
    if let Some(entity) = scene.find_by_name(key) {
        return Some(entity);
    }
    key.trim_start_matches('#')
        .parse()
        .ok()
        .and_then(|id| scene.find(id))
}

/// Load collision settings from a TOML file.
pub fn load_settings(path: impl AsRef<Path>) -> Result<CollisionSettings, RigidcadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(CollisionSettings::from_toml_str(&text)?)
}

/// Derive a parry3d collision shape for one entity of a JSON scene.
///
/// `entity` is resolved with [`find_entity`]; `kind` is a shape kind name
/// such as `"convex_hull"` or `"compound2"`.
pub fn collider_from_json(
    json: &str,
    entity: &str,
    kind: &str,
    apply_offset: bool,
    settings: &CollisionSettings,
) -> Result<EngineShape, RigidcadError> {
    let scene = Scene::from_json(json)?;
    let target =
        find_entity(&scene, entity).ok_or_else(|| RigidcadError::EntityNotFound(entity.into()))?;
    let kind: ShapeKind = kind.parse()?;

    let mut engine = ParryEngine::from_settings(settings);
    let key = rigidcad_collision::create(&mut engine, target, kind, apply_offset, settings)?;
    let shape = engine
        .take(key)
        .ok_or_else(|| CollisionError::Engine(format!("shape {key:?} vanished")))?;
    if engine.live_shapes() != 0 {
        log::warn!("{} shapes left behind in a scratch engine", engine.live_shapes());
    }
    Ok(shape)
}

/// Create one collision shape per direct child group of `root`.
///
/// Children that fail validation are logged and skipped.
pub fn colliders_for_children<E: CollisionEngine>(
    engine: &mut E,
    root: &Entity,
    kind: ShapeKind,
    settings: &CollisionSettings,
) -> Vec<(u64, E::Handle)> {
    root.children()
        .iter()
        .filter(|child| child.is_group() && settings.includes(child))
        .filter_map(
            |child| match rigidcad_collision::create(engine, child, kind, true, settings) {
                Ok(handle) => Some((child.id, handle)),
                Err(e) => {
                    log::warn!("no {kind} collision for {}: {e}", child.label());
                    None
                }
            },
        )
        .collect()
}
