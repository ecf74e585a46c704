#![warn(missing_docs)]

//! Read-only CAD scene tree for rigidcad.
//!
//! A scene is a tree of [`Entity`] values: leaves are faces, edges and
//! construction points; containers are groups carrying a transform relative
//! to their parent. The tree is owned by the document it was loaded from and
//! is never mutated by traversal.
//!
//! The [`traverse`] module walks a group's subtree and collects the geometry
//! used to derive collision shapes.

pub mod error;
mod mesh;
pub mod predicate;
pub mod primitives;
pub mod traverse;

pub use error::{SceneError, TraversalError};
pub use mesh::TriangleMesh;
pub use traverse::{Frame, RayHit, Traversal};

use std::collections::BTreeSet;

use rigidcad_math::{Point3, Transform};
use serde::{Deserialize, Serialize};

/// Unique identifier of an entity within its document.
pub type EntityId = u64;

fn default_true() -> bool {
    true
}

/// A planar face: an outer loop of vertices plus an optional triangulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Outer loop vertices in the face's parent frame.
    pub vertices: Vec<Point3>,
    /// Triangulation supplied by the host, as indices into `vertices`.
    ///
    /// When absent the loop is fanned from its first vertex, which is only
    /// correct for convex faces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triangles: Option<Vec<[u32; 3]>>,
}

impl Face {
    /// Create a face from its outer loop.
    pub fn new(vertices: Vec<Point3>) -> Self {
        Self {
            vertices,
            triangles: None,
        }
    }

    /// Triangles covering the face, with the loop's winding.
    ///
    /// Supplied triangles referencing missing vertices are dropped.
    pub fn triangulated_polygons(&self) -> Vec<[Point3; 3]> {
        match &self.triangles {
            Some(tris) => tris
                .iter()
                .filter_map(|&[a, b, c]| {
                    let v = |i: u32| self.vertices.get(i as usize).copied();
                    Some([v(a)?, v(b)?, v(c)?])
                })
                .collect(),
            None => {
                if self.vertices.len() < 3 {
                    return Vec::new();
                }
                let first = self.vertices[0];
                self.vertices
                    .windows(2)
                    .skip(1)
                    .map(|w| [first, w[0], w[1]])
                    .collect()
            }
        }
    }
}

/// A container of child entities with a transform relative to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Local transform: maps group coordinates into the parent frame.
    #[serde(default)]
    pub transform: Transform,
    /// Child entities.
    #[serde(default)]
    pub children: Vec<Entity>,
}

/// What an entity is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    /// A planar face.
    Face(Face),
    /// A straight edge.
    Edge {
        /// Start point.
        start: Point3,
        /// End point.
        end: Point3,
    },
    /// A construction point.
    Construction {
        /// Position of the point.
        point: Point3,
    },
    /// A group (or component instance) of child entities.
    Group(Group),
}

/// A node of the scene tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Liveness: `false` once the entity is deleted from its document.
    #[serde(default = "default_true")]
    pub valid: bool,
    /// Hidden entities are skipped by [`predicate::physical`].
    #[serde(default)]
    pub hidden: bool,
    /// Free-form tags consulted by inclusion predicates.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Kind-specific data.
    pub kind: EntityKind,
}

impl Entity {
    /// Create a valid, visible, untagged entity.
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            name: None,
            valid: true,
            hidden: false,
            tags: BTreeSet::new(),
            kind,
        }
    }

    /// A face entity with the given outer loop.
    pub fn face(id: EntityId, vertices: Vec<Point3>) -> Self {
        Self::new(id, EntityKind::Face(Face::new(vertices)))
    }

    /// A group entity.
    pub fn group(id: EntityId, transform: Transform, children: Vec<Entity>) -> Self {
        Self::new(id, EntityKind::Group(Group { transform, children }))
    }

    /// Set the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a tag.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Whether the entity carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Name if set, otherwise `#id`. Used in diagnostics.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} (#{})", self.id),
            None => format!("#{}", self.id),
        }
    }

    /// Whether this is a container.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, EntityKind::Group(_))
    }

    /// The group data, if this is a container.
    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            EntityKind::Group(g) => Some(g),
            _ => None,
        }
    }

    /// The face data, if this is a face.
    pub fn as_face(&self) -> Option<&Face> {
        match &self.kind {
            EntityKind::Face(f) => Some(f),
            _ => None,
        }
    }

    /// Children of a group; empty for leaves.
    pub fn children(&self) -> &[Entity] {
        match &self.kind {
            EntityKind::Group(g) => &g.children,
            _ => &[],
        }
    }

    /// Local transform of a group; `None` for leaves.
    pub fn local_transform(&self) -> Option<&Transform> {
        self.as_group().map(|g| &g.transform)
    }

    /// Depth-first search of this subtree (self included).
    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(id))
    }

    fn find_named(&self, name: &str) -> Option<&Entity> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find_named(name))
    }
}

/// A scene document: the top-level entities of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Format version string.
    pub version: String,
    /// Top-level entities.
    pub entities: Vec<Entity>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            entities: Vec::new(),
        }
    }
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Find an entity anywhere in the scene by id.
    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find_map(|e| e.find(id))
    }

    /// Find the first entity with the given name (depth-first).
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find_map(|e| e.find_named(name))
    }
}
