//! Shape kinds and the engine-ready descriptors derived for them.

use std::fmt;
use std::str::FromStr;

use rigidcad_math::{Point3, Transform, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::CollisionError;
use crate::settings::DecompositionParams;

/// Requested collision shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// No geometry.
    Null,
    /// Box fitted to the bounding box.
    Box,
    /// Ellipsoid fitted to the bounding box.
    Sphere,
    /// Cone along local X fitted to the bounding box.
    Cone,
    /// Cylinder along local X fitted to the bounding box.
    Cylinder,
    /// Cylinder with rounded rim along local X fitted to the bounding box.
    ChamferCylinder,
    /// Capsule along local X fitted to the bounding box.
    Capsule,
    /// Convex hull of every face vertex.
    ConvexHull,
    /// One convex hull per direct sub-group.
    Compound,
    /// Engine-side convex decomposition of the face triangles.
    CompoundFromConvexDecomposition,
    /// Triangle soup for static (non-moving) bodies.
    StaticMesh,
}

impl ShapeKind {
    /// Every shape kind.
    pub const ALL: [ShapeKind; 11] = [
        ShapeKind::Null,
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Cone,
        ShapeKind::Cylinder,
        ShapeKind::ChamferCylinder,
        ShapeKind::Capsule,
        ShapeKind::ConvexHull,
        ShapeKind::Compound,
        ShapeKind::CompoundFromConvexDecomposition,
        ShapeKind::StaticMesh,
    ];

    /// Snake-case name.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Null => "null",
            ShapeKind::Box => "box",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cone => "cone",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::ChamferCylinder => "chamfer_cylinder",
            ShapeKind::Capsule => "capsule",
            ShapeKind::ConvexHull => "convex_hull",
            ShapeKind::Compound => "compound",
            ShapeKind::CompoundFromConvexDecomposition => "compound_from_convex_decomposition",
            ShapeKind::StaticMesh => "static_mesh",
        }
    }

    /// Whether the shape is fitted to the entity's bounding box.
    pub fn is_bounding_volume(self) -> bool {
        matches!(
            self,
            ShapeKind::Box
                | ShapeKind::Sphere
                | ShapeKind::Cone
                | ShapeKind::Cylinder
                | ShapeKind::ChamferCylinder
                | ShapeKind::Capsule
        )
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = CollisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if key == "compound2" {
            return Ok(ShapeKind::Compound);
        }
        ShapeKind::ALL
            .into_iter()
            .find(|k| k.name() == key)
            .ok_or_else(|| CollisionError::UnknownShapeKind(s.to_string()))
    }
}

/// Dimensions of a shape revolved about its local X axis.
///
/// The cross-section is an ellipse with semi-axes `radius_y` and `radius_z`;
/// `length` is the full extent along X.
#[derive(Debug, Clone, PartialEq)]
pub struct Revolved {
    /// Half of the bounding box height.
    pub radius_y: f64,
    /// Half of the bounding box depth.
    pub radius_z: f64,
    /// Full bounding box width.
    pub length: f64,
    /// Placement of the shape's center.
    pub offset: Transform,
}

/// Point cloud whose convex hull the engine computes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    /// Scaled points; the X coordinate carries the mirror when flipped.
    pub points: Vec<Point3>,
    /// Rotation and origin of the entity, without scale.
    pub offset: Option<Transform>,
}

/// Aggregate of convex hulls sharing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    /// Hulls, one per source sub-group.
    pub parts: Vec<ConvexHull>,
    /// Rotation and origin of the entity, without scale.
    pub offset: Option<Transform>,
}

/// Triangle soup with outward winding.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMesh {
    /// Scaled triangles, re-wound when the entity is mirrored.
    pub triangles: Vec<[Point3; 3]>,
    /// Collide on both faces of every triangle.
    pub double_sided: bool,
    /// Rotation and origin of the entity, without scale.
    pub offset: Option<Transform>,
}

/// Triangle soup the engine splits into convex parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexDecomposition {
    /// Scaled triangles, re-wound when the entity is mirrored.
    pub triangles: Vec<[Point3; 3]>,
    /// Approximation parameters.
    pub params: DecompositionParams,
    /// Rotation and origin of the entity, without scale.
    pub offset: Option<Transform>,
}

/// Validated, engine-ready description of a collision shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDescriptor {
    /// No geometry.
    Null,
    /// Box with full extents `size`, centered on `offset`.
    Box {
        /// Width, height, depth.
        size: Vec3,
        /// Placement of the box center.
        offset: Transform,
    },
    /// Ellipsoid with semi-axes `radii`, centered on `offset`.
    Sphere {
        /// Semi-axes along X, Y, Z.
        radii: Vec3,
        /// Placement of the ellipsoid center.
        offset: Transform,
    },
    /// Cone.
    Cone(Revolved),
    /// Cylinder.
    Cylinder(Revolved),
    /// Capsule.
    Capsule(Revolved),
    /// Cylinder with a rounded rim.
    ChamferCylinder(Revolved),
    /// Convex hull of a point cloud.
    ConvexHull(ConvexHull),
    /// Several convex hulls.
    Compound(Compound),
    /// Static triangle mesh.
    StaticMesh(StaticMesh),
    /// Triangle mesh to decompose into convex parts.
    ConvexDecomposition(ConvexDecomposition),
}

impl ShapeDescriptor {
    /// The shape kind this descriptor was built for.
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeDescriptor::Null => ShapeKind::Null,
            ShapeDescriptor::Box { .. } => ShapeKind::Box,
            ShapeDescriptor::Sphere { .. } => ShapeKind::Sphere,
            ShapeDescriptor::Cone(_) => ShapeKind::Cone,
            ShapeDescriptor::Cylinder(_) => ShapeKind::Cylinder,
            ShapeDescriptor::Capsule(_) => ShapeKind::Capsule,
            ShapeDescriptor::ChamferCylinder(_) => ShapeKind::ChamferCylinder,
            ShapeDescriptor::ConvexHull(_) => ShapeKind::ConvexHull,
            ShapeDescriptor::Compound(_) => ShapeKind::Compound,
            ShapeDescriptor::StaticMesh(_) => ShapeKind::StaticMesh,
            ShapeDescriptor::ConvexDecomposition(_) => ShapeKind::CompoundFromConvexDecomposition,
        }
    }

    /// Placement of the shape relative to the body, if any.
    pub fn offset(&self) -> Option<&Transform> {
        match self {
            ShapeDescriptor::Null => None,
            ShapeDescriptor::Box { offset, .. } | ShapeDescriptor::Sphere { offset, .. } => {
                Some(offset)
            }
            ShapeDescriptor::Cone(r)
            | ShapeDescriptor::Cylinder(r)
            | ShapeDescriptor::Capsule(r)
            | ShapeDescriptor::ChamferCylinder(r) => Some(&r.offset),
            ShapeDescriptor::ConvexHull(h) => h.offset.as_ref(),
            ShapeDescriptor::Compound(c) => c.offset.as_ref(),
            ShapeDescriptor::StaticMesh(m) => m.offset.as_ref(),
            ShapeDescriptor::ConvexDecomposition(d) => d.offset.as_ref(),
        }
    }
}
