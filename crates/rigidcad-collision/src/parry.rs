//! [`CollisionEngine`] backed by parry3d shapes.

use std::f32::consts::FRAC_PI_2;

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use parry3d::mass_properties::MassProperties;
use parry3d::shape::{SharedShape, TriMesh, TriMeshFlags};
use parry3d::transformation::vhacd::VHACDParameters;
use rigidcad_math::Transform;
use rigidcad_scene::TriangleMesh;
use slotmap::SlotMap;

use crate::engine::CollisionEngine;
use crate::error::{CollisionError, Result};
use crate::settings::{CollisionSettings, DecompositionParams};
use crate::shape::{ConvexHull, Revolved, ShapeDescriptor};

slotmap::new_key_type! {
    /// Handle to a shape owned by a [`ParryEngine`].
    pub struct ShapeKey;
}

/// A parry shape and its placement relative to the body.
#[derive(Clone)]
pub struct EngineShape {
    /// The collision shape, `None` for a null collision.
    pub shape: Option<SharedShape>,
    /// Offset from the body frame.
    pub position: Isometry3<f32>,
}

impl EngineShape {
    /// The parry shape, if this is not a null collision.
    pub fn geometry(&self) -> Option<&SharedShape> {
        self.shape.as_ref()
    }

    /// Mass properties at uniform `density`, expressed in the body frame.
    pub fn mass_properties(&self, density: f32) -> MassProperties {
        match &self.shape {
            Some(shape) => shape.mass_properties(density).transform_by(&self.position),
            None => MassProperties::new(Point3::origin(), 0.0, Vector3::zeros()),
        }
    }

    /// Enclosed volume.
    pub fn volume(&self) -> f32 {
        self.shape
            .as_ref()
            .map_or(0.0, |shape| shape.mass_properties(1.0).mass())
    }
}

impl std::fmt::Debug for EngineShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineShape")
            .field("shape_type", &self.shape.as_ref().map(|s| s.shape_type()))
            .field("position", &self.position)
            .finish()
    }
}

/// Shape store producing parry3d shapes.
pub struct ParryEngine {
    shapes: SlotMap<ShapeKey, EngineShape>,
    ellipsoid_segments: u32,
}

impl Default for ParryEngine {
    fn default() -> Self {
        Self::from_settings(&CollisionSettings::default())
    }
}

impl ParryEngine {
    /// Create an empty engine with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty engine configured from `settings`.
    pub fn from_settings(settings: &CollisionSettings) -> Self {
        Self {
            shapes: SlotMap::with_key(),
            ellipsoid_segments: settings.ellipsoid_segments.max(4),
        }
    }

    /// Number of shapes currently owned.
    pub fn live_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Look up a shape.
    pub fn shape(&self, key: ShapeKey) -> Option<&EngineShape> {
        self.shapes.get(key)
    }

    /// Remove a shape and hand it to the caller.
    pub fn take(&mut self, key: ShapeKey) -> Option<EngineShape> {
        self.shapes.remove(key)
    }

    fn insert(&mut self, shape: Option<SharedShape>, position: Isometry3<f32>) -> ShapeKey {
        self.shapes.insert(EngineShape { shape, position })
    }

    fn ellipsoid(&self, radii: &Vector3<f32>) -> Result<SharedShape> {
        let n = self.ellipsoid_segments;
        let rings = n / 2;
        let mut points = vec![Point3::new(radii.x, 0.0, 0.0), Point3::new(-radii.x, 0.0, 0.0)];
        for i in 1..rings {
            let phi = std::f32::consts::PI * i as f32 / rings as f32;
            for j in 0..n {
                let theta = std::f32::consts::TAU * j as f32 / n as f32;
                points.push(Point3::new(
                    radii.x * phi.cos(),
                    radii.y * phi.sin() * theta.cos(),
                    radii.z * phi.sin() * theta.sin(),
                ));
            }
        }
        SharedShape::convex_hull(&points)
            .ok_or_else(|| CollisionError::Engine("ellipsoid hull failed".into()))
    }
}

/// Rigid placement for a scale-free, right-handed offset.
fn isometry(offset: Option<&Transform>) -> Isometry3<f32> {
    let Some(t) = offset else {
        return Isometry3::identity();
    };
    let unit = |v: rigidcad_math::Vec3| {
        let len = v.norm();
        if len > 0.0 {
            v / len
        } else {
            v
        }
    };
    let basis = Matrix3::from_columns(&[unit(t.xaxis()), unit(t.yaxis()), unit(t.zaxis())])
        .cast::<f32>();
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));
    let o = t.origin();
    Isometry3::from_parts(
        Translation3::new(o.x as f32, o.y as f32, o.z as f32),
        rotation,
    )
}

fn point(p: &rigidcad_math::Point3) -> Point3<f32> {
    Point3::new(p.x as f32, p.y as f32, p.z as f32)
}

/// Turns parry's Y-aligned revolved shapes onto local X.
fn y_to_x() -> Isometry3<f32> {
    Isometry3::rotation(Vector3::new(0.0, 0.0, -FRAC_PI_2))
}

fn revolved(r: &Revolved) -> (f32, f32) {
    if (r.radius_y - r.radius_z).abs() > rigidcad_math::EPSILON {
        log::warn!(
            "elliptic cross-section {}x{} approximated by its larger radius",
            r.radius_y,
            r.radius_z
        );
    }
    ((r.length / 2.0) as f32, r.radius_y.max(r.radius_z) as f32)
}

fn indexed(triangles: &[[rigidcad_math::Point3; 3]]) -> (Vec<Point3<f32>>, Vec<[u32; 3]>) {
    let mut mesh = TriangleMesh::new();
    for tri in triangles {
        mesh.add_triangle(tri);
    }
    (mesh.vertices.iter().map(point).collect(), mesh.indices)
}

fn vhacd(params: &DecompositionParams) -> VHACDParameters {
    log::debug!(
        "max_concavity {} and max_vertices_per_hull {} are not used by the parry decomposition",
        params.max_concavity,
        params.max_vertices_per_hull
    );
    VHACDParameters {
        concavity: params.concavity_tolerance as f32,
        max_convex_hulls: params.max_hulls,
        ..VHACDParameters::default()
    }
}

fn hull(h: &ConvexHull) -> Result<SharedShape> {
    let points: Vec<_> = h.points.iter().map(point).collect();
    SharedShape::convex_hull(&points)
        .ok_or_else(|| CollisionError::Engine("convex hull computation failed".into()))
}

impl CollisionEngine for ParryEngine {
    type Handle = ShapeKey;

    fn create_shape(&mut self, descriptor: &ShapeDescriptor) -> Result<ShapeKey> {
        let at = isometry(descriptor.offset());
        let (shape, position) = match descriptor {
            ShapeDescriptor::Null => return Ok(self.insert(None, at)),
            ShapeDescriptor::Box { size, .. } => {
                let h = size.cast::<f32>() / 2.0;
                (SharedShape::cuboid(h.x, h.y, h.z), at)
            }
            ShapeDescriptor::Sphere { radii, .. } => {
                let r = radii.cast::<f32>();
                let round = (r.x - r.y).abs() <= f32::EPSILON && (r.y - r.z).abs() <= f32::EPSILON;
                let shape = if round {
                    SharedShape::ball(r.x)
                } else {
                    self.ellipsoid(&r)?
                };
                (shape, at)
            }
            ShapeDescriptor::Cylinder(r) => {
                let (half, radius) = revolved(r);
                (SharedShape::cylinder(half, radius), at * y_to_x())
            }
            ShapeDescriptor::Cone(r) => {
                let (half, radius) = revolved(r);
                (SharedShape::cone(half, radius), at * y_to_x())
            }
            ShapeDescriptor::Capsule(r) => {
                let (half, radius) = revolved(r);
                (
                    SharedShape::capsule_y((half - radius).max(0.0), radius),
                    at * y_to_x(),
                )
            }
            ShapeDescriptor::ChamferCylinder(r) => {
                let (half, radius) = revolved(r);
                (
                    SharedShape::round_cylinder(0.0, (radius - half).max(0.0), half),
                    at * y_to_x(),
                )
            }
            ShapeDescriptor::ConvexHull(h) => (hull(h)?, at),
            ShapeDescriptor::Compound(c) => {
                let parts = c
                    .parts
                    .iter()
                    .map(|p| -> Result<_> { Ok((isometry(p.offset.as_ref()), hull(p)?)) })
                    .collect::<Result<Vec<_>>>()?;
                if parts.is_empty() {
                    return Err(CollisionError::Engine("compound has no parts".into()));
                }
                (SharedShape::compound(parts), at)
            }
            ShapeDescriptor::StaticMesh(m) => {
                let (vertices, indices) = indexed(&m.triangles);
                let mut flags = TriMeshFlags::MERGE_DUPLICATE_VERTICES;
                if !m.double_sided {
                    flags |= TriMeshFlags::ORIENTED;
                }
                let mesh = TriMesh::with_flags(vertices, indices, flags)
                    .map_err(|e| CollisionError::Engine(format!("{e:?}")))?;
                (SharedShape::new(mesh), at)
            }
            ShapeDescriptor::ConvexDecomposition(d) => {
                let (vertices, indices) = indexed(&d.triangles);
                let shape = SharedShape::convex_decomposition_with_params(
                    &vertices,
                    &indices,
                    &vhacd(&d.params),
                );
                (shape, at)
            }
        };
        Ok(self.insert(Some(shape), position))
    }

    fn create_compound(
        &mut self,
        parts: &[ShapeKey],
        offset: Option<&Transform>,
    ) -> Result<ShapeKey> {
        if parts.is_empty() {
            return Err(CollisionError::Engine("compound has no parts".into()));
        }
        let shapes = parts
            .iter()
            .filter_map(|&key| match self.shapes.get(key) {
                None => Some(Err(CollisionError::Engine(format!("unknown shape {key:?}")))),
                Some(EngineShape { shape: None, .. }) => None,
                Some(EngineShape {
                    shape: Some(shape),
                    position,
                }) => Some(if shape.as_compound().is_some() {
                    Err(CollisionError::Engine(format!("shape {key:?} is already composite")))
                } else {
                    Ok((*position, shape.clone()))
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        if shapes.is_empty() {
            return Err(CollisionError::Engine("compound has only null parts".into()));
        }
        Ok(self.insert(Some(SharedShape::compound(shapes)), isometry(offset)))
    }

    fn destroy(&mut self, handle: ShapeKey) {
        if self.shapes.remove(handle).is_none() {
            log::warn!("destroying unknown shape {handle:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::realize;
    use crate::shape::{Compound, StaticMesh};
    use approx::assert_relative_eq;
    use crate::builder::build_descriptor;
    use crate::settings::CollisionSettings;
    use crate::shape::ShapeKind;
    use rigidcad_scene::primitives::{cuboid_faces, tetrahedron};

    fn tetra() -> ConvexHull {
        ConvexHull {
            points: vec![
                rigidcad_math::Point3::origin(),
                rigidcad_math::Point3::new(1.0, 0.0, 0.0),
                rigidcad_math::Point3::new(0.0, 1.0, 0.0),
                rigidcad_math::Point3::new(0.0, 0.0, 1.0),
            ],
            offset: None,
        }
    }

    fn cube_triangles() -> Vec<[rigidcad_math::Point3; 3]> {
        cuboid_faces(
            1,
            rigidcad_math::Point3::origin(),
            rigidcad_math::Point3::new(1.0, 1.0, 1.0),
        )
        .iter()
        .filter_map(|e| e.as_face())
        .flat_map(|f| f.triangulated_polygons())
        .collect()
    }

    #[test]
    fn test_box_half_extents() {
        let mut engine = ParryEngine::new();
        let key = engine
            .create_shape(&ShapeDescriptor::Box {
                size: rigidcad_math::Vec3::new(2.0, 4.0, 6.0),
                offset: Transform::translation(1.0, 0.0, 0.0),
            })
            .unwrap();
        let s = engine.shape(key).unwrap();
        let cuboid = s.geometry().unwrap().as_cuboid().unwrap();
        assert_relative_eq!(cuboid.half_extents, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(s.position.translation.vector, Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(s.volume(), 48.0, epsilon = 1e-3);
    }

    #[test]
    fn test_sphere_and_ellipsoid() {
        let mut engine = ParryEngine::new();
        let ball = engine
            .create_shape(&ShapeDescriptor::Sphere {
                radii: rigidcad_math::Vec3::new(2.0, 2.0, 2.0),
                offset: Transform::identity(),
            })
            .unwrap();
        let geometry = engine.shape(ball).unwrap().geometry().unwrap();
        assert_relative_eq!(geometry.as_ball().unwrap().radius, 2.0);

        let ellipsoid = engine
            .create_shape(&ShapeDescriptor::Sphere {
                radii: rigidcad_math::Vec3::new(1.0, 2.0, 3.0),
                offset: Transform::identity(),
            })
            .unwrap();
        let s = engine.shape(ellipsoid).unwrap().geometry().unwrap();
        assert!(s.as_convex_polyhedron().is_some());
        let aabb = s.compute_local_aabb();
        assert_relative_eq!(aabb.maxs.x, 1.0, epsilon = 1e-4);
        assert!(aabb.maxs.z <= 3.0 + 1e-4);
    }

    #[test]
    fn test_cylinder_runs_along_x() {
        let mut engine = ParryEngine::new();
        let key = engine
            .create_shape(&ShapeDescriptor::Cylinder(Revolved {
                radius_y: 0.5,
                radius_z: 0.5,
                length: 4.0,
                offset: Transform::identity(),
            }))
            .unwrap();
        let s = engine.shape(key).unwrap();
        let aabb = s.geometry().unwrap().compute_aabb(&s.position);
        assert_relative_eq!(aabb.maxs.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.maxs.y, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_and_chamfer_cylinder() {
        let mut engine = ParryEngine::new();
        let r = Revolved {
            radius_y: 1.0,
            radius_z: 1.0,
            length: 6.0,
            offset: Transform::identity(),
        };
        let capsule = engine.create_shape(&ShapeDescriptor::Capsule(r.clone())).unwrap();
        let c = engine.shape(capsule).unwrap().geometry().unwrap().as_capsule().unwrap();
        assert_relative_eq!(c.radius, 1.0);
        assert_relative_eq!(c.half_height(), 2.0);

        let disc = Revolved {
            radius_y: 3.0,
            radius_z: 3.0,
            length: 1.0,
            offset: Transform::identity(),
        };
        let key = engine.create_shape(&ShapeDescriptor::ChamferCylinder(disc)).unwrap();
        let rc = engine.shape(key).unwrap().geometry().unwrap().as_round_cylinder().unwrap();
        assert_relative_eq!(rc.border_radius, 0.5);
        assert_relative_eq!(rc.inner_shape.radius, 2.5);
    }

    #[test]
    fn test_degenerate_hull_is_engine_error() {
        let mut engine = ParryEngine::new();
        let flat = ConvexHull {
            points: vec![rigidcad_math::Point3::origin(); 4],
            offset: None,
        };
        let err = engine
            .create_shape(&ShapeDescriptor::ConvexHull(flat))
            .unwrap_err();
        assert!(matches!(err, CollisionError::Engine(_)));
        assert_eq!(engine.live_shapes(), 0);
    }

    #[test]
    fn test_compound_keeps_only_result() {
        let mut engine = ParryEngine::new();
        let descriptor = ShapeDescriptor::Compound(Compound {
            parts: vec![tetra(), tetra()],
            offset: Some(Transform::translation(0.0, 0.0, 5.0)),
        });
        let key = realize(&mut engine, &descriptor).unwrap();
        assert_eq!(engine.live_shapes(), 1);
        let s = engine.shape(key).unwrap();
        assert_eq!(s.geometry().unwrap().as_compound().unwrap().shapes().len(), 2);
        assert_relative_eq!(s.position.translation.vector.z, 5.0);
    }

    #[test]
    fn test_static_mesh() {
        let mut engine = ParryEngine::new();
        let key = engine
            .create_shape(&ShapeDescriptor::StaticMesh(StaticMesh {
                triangles: cube_triangles(),
                double_sided: false,
                offset: None,
            }))
            .unwrap();
        let mesh = engine.shape(key).unwrap().geometry().unwrap().as_trimesh().unwrap();
        assert_eq!(mesh.vertices().len(), 8);
        assert_eq!(mesh.indices().len(), 12);
    }

    #[test]
    fn test_mirrored_hull_lands_where_the_entity_is() {
        let local = [
            rigidcad_math::Point3::new(1.0, 0.0, 0.0),
            rigidcad_math::Point3::new(2.0, 0.0, 0.0),
            rigidcad_math::Point3::new(1.0, 1.0, 0.0),
            rigidcad_math::Point3::new(1.0, 0.0, 1.0),
        ];
        let placement =
            Transform::translation(10.0, 0.0, 0.0).then(&Transform::scale(-2.0, 1.0, 1.0));
        let entity = tetrahedron(1, local, placement);
        let settings = CollisionSettings::default();
        let descriptor =
            build_descriptor(&entity, ShapeKind::ConvexHull, true, &settings).unwrap();

        let mut engine = ParryEngine::new();
        let key = engine.create_shape(&descriptor).unwrap();
        let shape = engine.shape(key).unwrap();
        let aabb = shape.geometry().unwrap().compute_aabb(&shape.position);
        assert_relative_eq!(aabb.mins.x, 6.0, epsilon = 1e-4);
        assert_relative_eq!(aabb.maxs.x, 8.0, epsilon = 1e-4);
        assert_relative_eq!(aabb.maxs.y, 1.0, epsilon = 1e-4);
        assert_relative_eq!(aabb.maxs.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotated_offset_isometry() {
        let offset = Transform::translation(3.0, 0.0, 0.0)
            .then(&Transform::rotation_z(std::f64::consts::FRAC_PI_2));
        let iso = isometry(Some(&offset));
        assert_relative_eq!(iso.rotation.angle(), std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
        assert_relative_eq!(iso.translation.vector.x, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_null_shape() {
        let mut engine = ParryEngine::new();
        let key = engine.create_shape(&ShapeDescriptor::Null).unwrap();
        let s = engine.shape(key).unwrap();
        assert!(s.geometry().is_none());
        assert_eq!(s.volume(), 0.0);
    }

    #[test]
    fn test_destroy() {
        let mut engine = ParryEngine::new();
        let key = engine
            .create_shape(&ShapeDescriptor::ConvexHull(tetra()))
            .unwrap();
        assert_eq!(engine.live_shapes(), 1);
        engine.destroy(key);
        assert_eq!(engine.live_shapes(), 0);
        assert!(engine.shape(key).is_none());
    }
}
