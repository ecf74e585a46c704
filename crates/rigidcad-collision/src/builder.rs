//! Derivation of shape descriptors from a group's geometry.
//!
//! Every function here is pure: it reads the entity snapshot and returns a
//! descriptor or a validation error. Nothing touches an engine.
//!
//! Geometry is collected in the entity's local frame and then scaled by the
//! entity's per-axis scale. When the entity is mirrored, the X scale is
//! negated and the offset's X axis is flipped back, so offsets are always
//! rigid and right-handed; applying the offset to the scaled geometry gives
//! the entity transform applied to the local geometry. Triangle soups are
//! additionally re-wound to keep outward normals.

use rigidcad_math::{
    coplanar, extract_matrix_scale, is_flipped, is_uniform, matrix_scale, Point3, Transform,
    Vec3, EPSILON,
};
use rigidcad_scene::traverse::{self, Traversal};
use rigidcad_scene::Entity;

use crate::error::{CollisionError, Result};
use crate::settings::CollisionSettings;
use crate::shape::{
    Compound, ConvexDecomposition, ConvexHull, Revolved, ShapeDescriptor, ShapeKind, StaticMesh,
};

/// Fewest points (and faces, for decomposition) a hull-like shape accepts.
const MIN_HULL_POINTS: usize = 4;

/// The entity's transform, checked and split into what the builders need.
struct EntityFrame<'a> {
    transform: &'a Transform,
    /// Per-axis scale, always positive.
    scale: Vec3,
    /// Per-axis scale with X negated when mirrored.
    signed_scale: Vec3,
    flipped: bool,
}

impl EntityFrame<'_> {
    fn scale_point(&self, p: &Point3) -> Point3 {
        Point3::from(p.coords.component_mul(&self.signed_scale))
    }

    fn scale_points(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|p| self.scale_point(p)).collect()
    }

    fn scale_triangles(&self, triangles: &[[Point3; 3]]) -> Vec<[Point3; 3]> {
        triangles
            .iter()
            .map(|t| {
                let [a, b, c] = [
                    self.scale_point(&t[0]),
                    self.scale_point(&t[1]),
                    self.scale_point(&t[2]),
                ];
                // Winding and scale sign are separate corrections; both apply.
                if self.flipped {
                    [c, b, a]
                } else {
                    [a, b, c]
                }
            })
            .collect()
    }

    /// Rigid, right-handed placement of the entity's axes at `origin`.
    ///
    /// The reflection of a mirrored entity lives in the scaled geometry, so
    /// it is taken out of the axes here.
    fn rigid_at(&self, origin: &Point3) -> Transform {
        let unit = extract_matrix_scale(self.transform);
        let xaxis = if self.flipped {
            -unit.xaxis()
        } else {
            unit.xaxis()
        };
        Transform::from_axes(&xaxis, &unit.yaxis(), &unit.zaxis(), origin)
    }

    /// Unscaled placement of the entity, when requested.
    fn unscaled_offset(&self, apply_offset: bool) -> Option<Transform> {
        apply_offset.then(|| self.rigid_at(&self.transform.origin()))
    }
}

fn check_entity(entity: &Entity) -> Result<EntityFrame<'_>> {
    if !entity.valid {
        return Err(CollisionError::InvalidEntity {
            entity: entity.label(),
            reason: "entity is deleted".into(),
        });
    }
    let transform = entity
        .local_transform()
        .ok_or_else(|| CollisionError::InvalidEntity {
            entity: entity.label(),
            reason: "expected a group".into(),
        })?;
    if !is_uniform(transform) {
        return Err(CollisionError::NonUniformTransform {
            entity: entity.label(),
        });
    }
    let scale = matrix_scale(transform);
    if scale.iter().any(|&s| s <= EPSILON) {
        return Err(CollisionError::DegenerateScale {
            entity: entity.label(),
            scale: scale.into(),
        });
    }
    let flipped = is_flipped(transform);
    let mut signed_scale = scale;
    if flipped {
        signed_scale.x = -signed_scale.x;
    }
    Ok(EntityFrame {
        transform,
        scale,
        signed_scale,
        flipped,
    })
}

/// Check a point set for hull construction.
fn check_hull_points(entity: &Entity, points: &[Point3]) -> Result<()> {
    if points.len() < MIN_HULL_POINTS {
        return Err(CollisionError::InsufficientGeometry {
            entity: entity.label(),
            what: "points",
            required: MIN_HULL_POINTS,
            found: points.len(),
        });
    }
    if coplanar(points) {
        return Err(CollisionError::CoplanarGeometry {
            entity: entity.label(),
        });
    }
    Ok(())
}

/// Derive the descriptor of `kind` for `entity`.
///
/// `entity` must be a live group with a uniform, non-degenerate transform
/// (except for [`ShapeKind::Null`], which needs nothing). With `apply_offset`
/// the descriptor carries the entity's placement; otherwise it is expressed
/// relative to the entity's origin.
pub fn build_descriptor(
    entity: &Entity,
    kind: ShapeKind,
    apply_offset: bool,
    settings: &CollisionSettings,
) -> Result<ShapeDescriptor> {
    if kind == ShapeKind::Null {
        return Ok(ShapeDescriptor::Null);
    }
    let frame = check_entity(entity)?;
    let descriptor = if kind.is_bounding_volume() {
        let (size, offset) = fitted_box(entity, &frame, apply_offset, settings)?;
        fitted(kind, size, offset)
    } else {
        match kind {
            ShapeKind::ConvexHull => convex_hull(entity, &frame, apply_offset, settings)?,
            ShapeKind::Compound => compound(entity, &frame, apply_offset, settings)?,
            ShapeKind::StaticMesh => static_mesh(entity, &frame, apply_offset, settings)?,
            ShapeKind::CompoundFromConvexDecomposition => {
                convex_decomposition(entity, &frame, apply_offset, settings)?
            }
            _ => ShapeDescriptor::Null,
        }
    };
    log::debug!("built {kind} descriptor for entity {}", entity.label());
    Ok(descriptor)
}

/// Size and placement of the box fitted around the included faces.
fn fitted_box(
    entity: &Entity,
    frame: &EntityFrame<'_>,
    apply_offset: bool,
    settings: &CollisionSettings,
) -> Result<(Vec3, Transform)> {
    let bb = traverse::bounding_box_from_faces(entity, &Traversal::local(), |e| {
        settings.includes(e)
    })?;
    if bb.is_flat() {
        return Err(CollisionError::FlatGeometry {
            entity: entity.label(),
            extents: bb.extents().into(),
        });
    }

    let center = bb.center();
    let offset = if apply_offset {
        frame.rigid_at(&frame.transform.apply_point(&center))
    } else {
        let c = frame.scale_point(&center);
        Transform::translation(c.x, c.y, c.z)
    };
    Ok((bb.extents().component_mul(&frame.scale), offset))
}

/// Descriptor of a bounding-volume kind fitted to a box of `size`.
fn fitted(kind: ShapeKind, size: Vec3, offset: Transform) -> ShapeDescriptor {
    match kind {
        ShapeKind::Sphere => ShapeDescriptor::Sphere {
            radii: size * 0.5,
            offset,
        },
        ShapeKind::Cone => ShapeDescriptor::Cone(revolved(size, offset)),
        ShapeKind::Cylinder => ShapeDescriptor::Cylinder(revolved(size, offset)),
        ShapeKind::Capsule => ShapeDescriptor::Capsule(revolved(size, offset)),
        ShapeKind::ChamferCylinder => ShapeDescriptor::ChamferCylinder(revolved(size, offset)),
        _ => ShapeDescriptor::Box { size, offset },
    }
}

/// Cone, cylinder and capsule parameters: half height, half depth, full width.
fn revolved(size: Vec3, offset: Transform) -> Revolved {
    Revolved {
        radius_y: size.y * 0.5,
        radius_z: size.z * 0.5,
        length: size.x,
        offset,
    }
}

fn convex_hull(
    entity: &Entity,
    frame: &EntityFrame<'_>,
    apply_offset: bool,
    settings: &CollisionSettings,
) -> Result<ShapeDescriptor> {
    let points =
        traverse::vertices_from_faces(entity, &Traversal::local(), |e| settings.includes(e))?;
    check_hull_points(entity, &points)?;
    Ok(ShapeDescriptor::ConvexHull(ConvexHull {
        points: frame.scale_points(&points),
        offset: frame.unscaled_offset(apply_offset),
    }))
}

fn compound(
    entity: &Entity,
    frame: &EntityFrame<'_>,
    apply_offset: bool,
    settings: &CollisionSettings,
) -> Result<ShapeDescriptor> {
    let sets =
        traverse::vertices_per_group(entity, &Traversal::local(), |e| settings.includes(e))?;
    let total = sets.len();
    let parts: Vec<ConvexHull> = sets
        .iter()
        .enumerate()
        .filter_map(|(i, points)| match check_hull_points(entity, points) {
            Ok(()) => Some(ConvexHull {
                points: frame.scale_points(points),
                offset: None,
            }),
            Err(e) => {
                log::warn!("skipping sub-collision {i} of {}: {e}", entity.label());
                None
            }
        })
        .collect();

    if parts.is_empty() {
        return Err(CollisionError::NoValidSubshapes {
            entity: entity.label(),
        });
    }
    log::debug!(
        "compound for {}: {} of {total} sub-collisions kept",
        entity.label(),
        parts.len()
    );
    Ok(ShapeDescriptor::Compound(Compound {
        parts,
        offset: frame.unscaled_offset(apply_offset),
    }))
}

fn static_mesh(
    entity: &Entity,
    frame: &EntityFrame<'_>,
    apply_offset: bool,
    settings: &CollisionSettings,
) -> Result<ShapeDescriptor> {
    let polygons =
        traverse::polygons_from_faces(entity, &Traversal::local(), |e| settings.includes(e))?;
    if polygons.is_empty() {
        return Err(CollisionError::InsufficientGeometry {
            entity: entity.label(),
            what: "faces",
            required: 1,
            found: 0,
        });
    }
    Ok(ShapeDescriptor::StaticMesh(StaticMesh {
        triangles: frame.scale_triangles(&polygons),
        double_sided: settings.double_sided_meshes,
        offset: frame.unscaled_offset(apply_offset),
    }))
}

fn convex_decomposition(
    entity: &Entity,
    frame: &EntityFrame<'_>,
    apply_offset: bool,
    settings: &CollisionSettings,
) -> Result<ShapeDescriptor> {
    let polygons =
        traverse::polygons_from_faces(entity, &Traversal::local(), |e| settings.includes(e))?;
    if polygons.len() < MIN_HULL_POINTS {
        return Err(CollisionError::InsufficientGeometry {
            entity: entity.label(),
            what: "faces",
            required: MIN_HULL_POINTS,
            found: polygons.len(),
        });
    }
    Ok(ShapeDescriptor::ConvexDecomposition(ConvexDecomposition {
        triangles: frame.scale_triangles(&polygons),
        params: settings.decomposition.clone(),
        offset: frame.unscaled_offset(apply_offset),
    }))
}
