//! Depth-first collection of geometry from a group's subtree.
//!
//! Every operation takes a root group, a [`Traversal`] (recursion flag and
//! output frame) and an inclusion predicate. The walk is pre-order. A group
//! rejected by the predicate is skipped together with its whole subtree; a
//! rejected leaf is skipped alone. Deleted children are skipped as well.
//!
//! Child group transforms are always applied so that nested geometry lands
//! in the root's frame. The root's own transform is only applied for
//! [`Frame::Global`]; in [`Frame::Local`] leaves directly under the root are
//! copied without any matrix work.
//!
//! Empty results are not errors. Callers decide whether emptiness matters.

use std::collections::HashSet;

use rigidcad_math::{is_flipped, BoundingBox, Point3, Ray, Transform};

use crate::error::TraversalError;
use crate::mesh::{point_key, TriangleMesh};
use crate::{Entity, EntityId, EntityKind, Group};

/// Coordinate frame of traversal output.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Frame {
    /// The root group's own coordinates.
    #[default]
    Local,
    /// The coordinates of the root's parent, reached through the given
    /// parent-to-ancestor transform and then the root's own transform.
    Global(Transform),
}

/// Traversal options.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    /// Descend into child groups.
    pub recursive: bool,
    /// Output frame.
    pub frame: Frame,
}

impl Default for Traversal {
    fn default() -> Self {
        Self {
            recursive: true,
            frame: Frame::Local,
        }
    }
}

impl Traversal {
    /// Recursive walk producing root-local coordinates.
    pub fn local() -> Self {
        Self::default()
    }

    /// Recursive walk producing coordinates in the frame `parent` maps to.
    ///
    /// Pass the identity for a top-level entity to get model coordinates.
    pub fn global(parent: Transform) -> Self {
        Self {
            recursive: true,
            frame: Frame::Global(parent),
        }
    }

    /// Only visit the root's direct children.
    pub fn shallow(mut self) -> Self {
        self.recursive = false;
        self
    }
}

/// Where leaves of the group being walked end up.
struct Placement {
    transform: Option<Transform>,
    flipped: bool,
}

impl Placement {
    fn new(transform: Option<Transform>) -> Self {
        let flipped = transform.as_ref().is_some_and(is_flipped);
        Self { transform, flipped }
    }

    fn nested(&self, child: &Transform) -> Self {
        let composed = match &self.transform {
            Some(t) => t.then(child),
            None => child.clone(),
        };
        Self::new(Some(composed))
    }

    fn point(&self, p: &Point3) -> Point3 {
        match &self.transform {
            Some(t) => t.apply_point(p),
            None => *p,
        }
    }

    /// Place a triangle, reversing it under a mirroring transform so it
    /// keeps facing outward.
    fn triangle(&self, tri: &[Point3; 3]) -> [Point3; 3] {
        let [a, b, c] = [self.point(&tri[0]), self.point(&tri[1]), self.point(&tri[2])];
        if self.flipped {
            [c, b, a]
        } else {
            [a, b, c]
        }
    }
}

fn root_group(root: &Entity) -> Result<&Group, TraversalError> {
    if !root.valid {
        return Err(TraversalError::Destroyed {
            entity: root.label(),
        });
    }
    root.as_group().ok_or_else(|| TraversalError::NotAGroup {
        entity: root.label(),
    })
}

fn start(group: &Group, opts: &Traversal) -> Placement {
    match &opts.frame {
        Frame::Local => Placement::new(None),
        Frame::Global(parent) => Placement::new(Some(parent.then(&group.transform))),
    }
}

fn walk<'a>(
    group: &'a Group,
    at: &Placement,
    recursive: bool,
    pred: &dyn Fn(&Entity) -> bool,
    visit: &mut dyn FnMut(&'a Entity, &Placement),
) {
    for child in &group.children {
        if !child.valid || !pred(child) {
            continue;
        }
        match &child.kind {
            EntityKind::Group(g) => {
                if recursive {
                    walk(g, &at.nested(&g.transform), recursive, pred, visit);
                }
            }
            _ => visit(child, at),
        }
    }
}

fn walk_root<'a, P>(
    root: &'a Entity,
    opts: &Traversal,
    pred: P,
    visit: &mut dyn FnMut(&'a Entity, &Placement),
) -> Result<(), TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let group = root_group(root)?;
    walk(group, &start(group, opts), opts.recursive, &pred, visit);
    Ok(())
}

/// Collects face vertices, dropping exact duplicates but keeping order.
#[derive(Default)]
struct PointSet {
    seen: HashSet<[u64; 3]>,
    points: Vec<Point3>,
}

impl PointSet {
    fn insert(&mut self, p: Point3) {
        if self.seen.insert(point_key(&p)) {
            self.points.push(p);
        }
    }
}

/// Bounding box of the vertices of every included face.
pub fn bounding_box_from_faces<P>(
    root: &Entity,
    opts: &Traversal,
    pred: P,
) -> Result<BoundingBox, TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let mut bb = BoundingBox::empty();
    walk_root(root, opts, pred, &mut |e, at| {
        if let Some(face) = e.as_face() {
            for v in &face.vertices {
                bb.include_point(&at.point(v));
            }
        }
    })?;
    Ok(bb)
}

/// Distinct vertices of every included face, in visiting order.
pub fn vertices_from_faces<P>(
    root: &Entity,
    opts: &Traversal,
    pred: P,
) -> Result<Vec<Point3>, TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let mut set = PointSet::default();
    walk_root(root, opts, pred, &mut |e, at| {
        if let Some(face) = e.as_face() {
            for v in &face.vertices {
                set.insert(at.point(v));
            }
        }
    })?;
    Ok(set.points)
}

/// Triangulated polygons of every included face.
pub fn polygons_from_faces<P>(
    root: &Entity,
    opts: &Traversal,
    pred: P,
) -> Result<Vec<[Point3; 3]>, TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let mut polygons = Vec::new();
    walk_root(root, opts, pred, &mut |e, at| {
        if let Some(face) = e.as_face() {
            polygons.extend(face.triangulated_polygons().iter().map(|t| at.triangle(t)));
        }
    })?;
    Ok(polygons)
}

/// Indexed mesh of every included face.
pub fn triangle_mesh<P>(
    root: &Entity,
    opts: &Traversal,
    pred: P,
) -> Result<TriangleMesh, TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let mut mesh = TriangleMesh::new();
    for tri in polygons_from_faces(root, opts, pred)? {
        mesh.add_triangle(&tri);
    }
    Ok(mesh)
}

/// Face vertices kept apart per direct child group.
///
/// Each included child group of the root yields one set holding its whole
/// subtree (subject to `opts.recursive` below that level). Faces directly
/// under the root form one more, final set. Sets never merge, and empty
/// sets are dropped.
pub fn vertices_per_group<P>(
    root: &Entity,
    opts: &Traversal,
    pred: P,
) -> Result<Vec<Vec<Point3>>, TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let group = root_group(root)?;
    let at = start(group, opts);
    let mut sets = Vec::new();
    let mut loose = PointSet::default();

    for child in &group.children {
        if !child.valid || !pred(child) {
            continue;
        }
        match &child.kind {
            EntityKind::Group(g) => {
                let mut set = PointSet::default();
                let nested = at.nested(&g.transform);
                walk(g, &nested, opts.recursive, &pred, &mut |e, placed| {
                    if let Some(face) = e.as_face() {
                        for v in &face.vertices {
                            set.insert(placed.point(v));
                        }
                    }
                });
                if !set.points.is_empty() {
                    sets.push(set.points);
                }
            }
            EntityKind::Face(face) => {
                for v in &face.vertices {
                    loose.insert(at.point(v));
                }
            }
            _ => {}
        }
    }

    if !loose.points.is_empty() {
        sets.push(loose.points);
    }
    Ok(sets)
}

/// Positions of every included construction point.
pub fn construction_points<P>(
    root: &Entity,
    opts: &Traversal,
    pred: P,
) -> Result<Vec<Point3>, TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let mut points = Vec::new();
    walk_root(root, opts, pred, &mut |e, at| {
        if let EntityKind::Construction { point } = &e.kind {
            points.push(at.point(point));
        }
    })?;
    Ok(points)
}

/// End points of every included edge.
pub fn edges<P>(
    root: &Entity,
    opts: &Traversal,
    pred: P,
) -> Result<Vec<[Point3; 2]>, TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let mut out = Vec::new();
    walk_root(root, opts, pred, &mut |e, at| {
        if let EntityKind::Edge { start, end } = &e.kind {
            out.push([at.point(start), at.point(end)]);
        }
    })?;
    Ok(out)
}

/// Closest face hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Face that was hit.
    pub entity: EntityId,
    /// Hit point, in the traversal's output frame.
    pub point: Point3,
    /// Distance from the ray origin.
    pub distance: f64,
}

/// Cast a ray against every included face and return the closest hit.
///
/// The ray is expressed in the traversal's output frame.
pub fn raycast<P>(
    root: &Entity,
    opts: &Traversal,
    pred: P,
    ray: &Ray,
) -> Result<Option<RayHit>, TraversalError>
where
    P: Fn(&Entity) -> bool,
{
    let mut best: Option<RayHit> = None;
    walk_root(root, opts, pred, &mut |e, at| {
        let Some(face) = e.as_face() else {
            return;
        };
        let placed: Vec<[Point3; 3]> = face
            .triangulated_polygons()
            .iter()
            .map(|t| at.triangle(t))
            .collect();
        if let Some((_, t)) = ray.closest_triangle(&placed) {
            if best.map_or(true, |b| t < b.distance) {
                best = Some(RayHit {
                    entity: e.id,
                    point: ray.at(t),
                    distance: t,
                });
            }
        }
    })?;
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{include_all, physical, IGNORE_TAG};
    use crate::primitives::{cuboid, cuboid_faces};
    use approx::assert_relative_eq;
    use rigidcad_math::{plane_normal, Vec3};

    fn unit_cube_group(transform: Transform) -> Entity {
        cuboid(1, Point3::origin(), Point3::new(1.0, 1.0, 1.0), transform)
    }

    /// root (translated) -> [child cube at +10 x, loose triangle]
    fn nested_scene() -> Entity {
        let child = cuboid(
            100,
            Point3::origin(),
            Point3::new(1.0, 1.0, 1.0),
            Transform::translation(10.0, 0.0, 0.0),
        );
        let loose = Entity::face(
            200,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        Entity::group(1, Transform::translation(0.0, 0.0, 5.0), vec![child, loose])
    }

    #[test]
    fn test_root_must_be_group() {
        let face = Entity::face(7, vec![Point3::origin()]);
        let err = vertices_from_faces(&face, &Traversal::local(), include_all).unwrap_err();
        assert_eq!(err, TraversalError::NotAGroup { entity: "#7".into() });
    }

    #[test]
    fn test_destroyed_root() {
        let mut root = unit_cube_group(Transform::identity());
        root.valid = false;
        let err = bounding_box_from_faces(&root, &Traversal::local(), include_all).unwrap_err();
        assert!(matches!(err, TraversalError::Destroyed { .. }));
    }

    #[test]
    fn test_cube_vertices_are_distinct() {
        let root = unit_cube_group(Transform::identity());
        let pts = vertices_from_faces(&root, &Traversal::local(), include_all).unwrap();
        assert_eq!(pts.len(), 8);
        let polys = polygons_from_faces(&root, &Traversal::local(), include_all).unwrap();
        assert_eq!(polys.len(), 12);
        let mesh = triangle_mesh(&root, &Traversal::local(), include_all).unwrap();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_triangles(), 12);
    }

    #[test]
    fn test_signed_zero_vertices_agree() {
        let face = |id, zero: f64| {
            Entity::face(
                id,
                vec![
                    Point3::new(zero, 0.0, 0.0),
                    Point3::new(1.0, 0.0, 0.0),
                    Point3::new(0.0, 1.0, zero),
                ],
            )
        };
        let root = Entity::group(1, Transform::identity(), vec![face(2, 0.0), face(3, -0.0)]);
        let pts = vertices_from_faces(&root, &Traversal::local(), include_all).unwrap();
        let mesh = triangle_mesh(&root, &Traversal::local(), include_all).unwrap();
        assert_eq!(pts.len(), 3);
        assert_eq!(mesh.num_vertices(), pts.len());
    }

    #[test]
    fn test_local_frame_ignores_root_transform() {
        let root = nested_scene();
        let bb = bounding_box_from_faces(&root, &Traversal::local(), include_all).unwrap();
        assert_relative_eq!(bb.min, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(bb.max, Point3::new(11.0, 1.0, 1.0));
    }

    #[test]
    fn test_global_frame_applies_root_and_parent() {
        let root = nested_scene();
        let opts = Traversal::global(Transform::translation(0.0, 100.0, 0.0));
        let bb = bounding_box_from_faces(&root, &opts, include_all).unwrap();
        assert_relative_eq!(bb.min, Point3::new(0.0, 100.0, 5.0));
        assert_relative_eq!(bb.max, Point3::new(11.0, 101.0, 6.0));
    }

    #[test]
    fn test_shallow_skips_child_groups() {
        let root = nested_scene();
        let pts = vertices_from_faces(&root, &Traversal::local().shallow(), include_all).unwrap();
        assert_eq!(pts.len(), 3);
    }

    #[test]
    fn test_rejected_group_prunes_subtree() {
        // the grandchild passes the predicate on its own but sits under an ignored group
        let grandchild = Entity::group(
            50,
            Transform::identity(),
            cuboid_faces(51, Point3::new(5.0, 5.0, 5.0), Point3::new(6.0, 6.0, 6.0)),
        );
        let ignored = Entity::group(40, Transform::identity(), vec![grandchild]).tagged(IGNORE_TAG);
        let root = Entity::group(
            1,
            Transform::identity(),
            vec![ignored, unit_cube_group(Transform::identity())],
        );

        let bb = bounding_box_from_faces(&root, &Traversal::local(), physical).unwrap();
        assert_relative_eq!(bb.max, Point3::new(1.0, 1.0, 1.0));
        let pts = vertices_from_faces(&root, &Traversal::local(), physical).unwrap();
        assert!(pts.iter().all(|p| p.x <= 1.0));
    }

    #[test]
    fn test_rejected_leaf_is_skipped_alone() {
        let mut faces = cuboid_faces(2, Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        faces[0].hidden = true;
        let root = Entity::group(1, Transform::identity(), faces);
        let polys = polygons_from_faces(&root, &Traversal::local(), physical).unwrap();
        assert_eq!(polys.len(), 10);
    }

    #[test]
    fn test_deleted_children_are_skipped() {
        let mut faces = cuboid_faces(2, Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        for f in &mut faces {
            f.valid = false;
        }
        let root = Entity::group(1, Transform::identity(), faces);
        assert!(polygons_from_faces(&root, &Traversal::local(), include_all)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_group_is_not_an_error() {
        let root = Entity::group(1, Transform::identity(), vec![]);
        assert!(vertices_from_faces(&root, &Traversal::local(), include_all)
            .unwrap()
            .is_empty());
        assert!(bounding_box_from_faces(&root, &Traversal::local(), include_all)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_vertices_per_group_keeps_sets_apart() {
        let a = cuboid(10, Point3::origin(), Point3::new(1.0, 1.0, 1.0), Transform::identity());
        let b = cuboid(
            20,
            Point3::origin(),
            Point3::new(1.0, 1.0, 1.0),
            Transform::translation(3.0, 0.0, 0.0),
        );
        let hidden = cuboid(30, Point3::origin(), Point3::new(1.0, 1.0, 1.0), Transform::identity())
            .tagged(IGNORE_TAG);
        let root = Entity::group(1, Transform::identity(), vec![a, b, hidden]);

        let sets = vertices_per_group(&root, &Traversal::local(), physical).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].len(), 8);
        assert_eq!(sets[1].len(), 8);
        assert!(sets[1].iter().all(|p| p.x >= 3.0));
    }

    #[test]
    fn test_vertices_per_group_collects_loose_faces_last() {
        let root = nested_scene();
        let sets = vertices_per_group(&root, &Traversal::local(), include_all).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].len(), 8);
        assert_eq!(sets[1].len(), 3);
    }

    #[test]
    fn test_mirrored_child_keeps_outward_winding() {
        let plain = unit_cube_group(Transform::identity());
        let mirrored = unit_cube_group(Transform::scale(-1.0, 1.0, 1.0));
        let root = Entity::group(1, Transform::identity(), vec![mirrored]);

        let reference = polygons_from_faces(&plain, &Traversal::local(), include_all).unwrap();
        let polys = polygons_from_faces(&root, &Traversal::local(), include_all).unwrap();
        assert_eq!(polys.len(), reference.len());
        let center = Point3::new(-0.5, 0.5, 0.5);
        for tri in &polys {
            let n = plane_normal(&tri[0], &tri[1], &tri[2]);
            assert!(n.dot(&(tri[0] - center)) > 0.0);
        }
    }

    #[test]
    fn test_construction_points_and_edges() {
        let root = Entity::group(
            1,
            Transform::identity(),
            vec![
                Entity::new(2, EntityKind::Construction { point: Point3::new(1.0, 2.0, 3.0) }),
                Entity::new(
                    3,
                    EntityKind::Edge {
                        start: Point3::origin(),
                        end: Point3::new(1.0, 0.0, 0.0),
                    },
                ),
            ],
        );
        let opts = Traversal::global(Transform::translation(1.0, 1.0, 1.0));
        let pts = construction_points(&root, &opts, include_all).unwrap();
        assert_relative_eq!(pts[0], Point3::new(2.0, 3.0, 4.0));
        let es = edges(&root, &opts, include_all).unwrap();
        assert_relative_eq!(es[0][1], Point3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn test_raycast_closest_face() {
        let root = nested_scene();
        let ray = Ray::new(Point3::new(10.5, 0.5, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = raycast(&root, &Traversal::local(), include_all, &ray)
            .unwrap()
            .unwrap();
        // top face of the child cube (faces 101..107, top is the second)
        assert_eq!(hit.entity, 102);
        assert_relative_eq!(hit.point, Point3::new(10.5, 0.5, 1.0), epsilon = 1e-9);
        assert_relative_eq!(hit.distance, 9.0, epsilon = 1e-9);
    }
}
