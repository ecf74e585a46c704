//! Small solids built from faces, for tests and demos.
//!
//! Faces wind counter-clockwise when viewed from outside the solid.

use rigidcad_math::{plane_normal, Point3, Transform};

use crate::{Entity, EntityId};

/// The six outward-facing quads of an axis-aligned box.
///
/// Faces get ids `first_id..first_id + 6`.
/// ```text
///     v4----v5
///    /|    /|
///   v7----v6|    z
///   | v0--|-v1   | y
///   |/    |/     |/
///   v3----v2     +---x
/// ```
pub fn cuboid_faces(first_id: EntityId, min: Point3, max: Point3) -> Vec<Entity> {
    let v = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];
    let loops: [[usize; 4]; 6] = [
        [0, 3, 2, 1], // bottom
        [4, 5, 6, 7], // top
        [0, 1, 5, 4], // front
        [3, 7, 6, 2], // back
        [0, 4, 7, 3], // left
        [1, 2, 6, 5], // right
    ];
    loops
        .iter()
        .zip(first_id..)
        .map(|(l, id)| Entity::face(id, l.iter().map(|&i| v[i]).collect()))
        .collect()
}

/// The four outward-facing triangles of a tetrahedron.
///
/// Faces get ids `first_id..first_id + 4`.
pub fn tetrahedron_faces(first_id: EntityId, p: [Point3; 4]) -> Vec<Entity> {
    let opposite = [(1, 2, 3, 0), (0, 3, 2, 1), (0, 1, 3, 2), (0, 2, 1, 3)];
    opposite
        .iter()
        .zip(first_id..)
        .map(|(&(a, b, c, apex), id)| {
            let n = plane_normal(&p[a], &p[b], &p[c]);
            let tri = if n.dot(&(p[apex] - p[a])) > 0.0 {
                vec![p[a], p[c], p[b]]
            } else {
                vec![p[a], p[b], p[c]]
            };
            Entity::face(id, tri)
        })
        .collect()
}

/// A group holding a box. The group has id `id`, its faces `id + 1..`.
pub fn cuboid(id: EntityId, min: Point3, max: Point3, transform: Transform) -> Entity {
    Entity::group(id, transform, cuboid_faces(id + 1, min, max))
}

/// A group holding a tetrahedron. The group has id `id`, its faces `id + 1..`.
pub fn tetrahedron(id: EntityId, p: [Point3; 4], transform: Transform) -> Entity {
    Entity::group(id, transform, tetrahedron_faces(id + 1, p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidcad_math::centroid;

    fn assert_outward(faces: &[Entity]) {
        let all: Vec<Point3> = faces
            .iter()
            .flat_map(|f| f.as_face().unwrap().vertices.clone())
            .collect();
        let center = centroid(&all).unwrap();
        for face in faces {
            let v = &face.as_face().unwrap().vertices;
            let n = plane_normal(&v[0], &v[1], &v[2]);
            assert!(n.dot(&(v[0] - center)) > 0.0, "face {} points inward", face.id);
        }
    }

    #[test]
    fn test_cuboid_faces_outward() {
        let faces = cuboid_faces(1, Point3::origin(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(faces.len(), 6);
        assert_eq!(faces[5].id, 6);
        assert_outward(&faces);
    }

    #[test]
    fn test_tetrahedron_faces_outward() {
        let faces = tetrahedron_faces(
            10,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
        );
        assert_eq!(faces.len(), 4);
        assert_eq!(faces[0].id, 10);
        assert_outward(&faces);
    }
}
