//! Ray representation and ray-triangle tests.

use crate::predicates::triangle_hit_parameter;
use crate::{Dir3, Point3, Vec3};

/// A ray in 3D space defined by origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: Dir3::new_normalize(direction),
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Distance along the ray to a triangle, hitting either face.
    pub fn intersect_triangle(&self, tri: &[Point3; 3]) -> Option<f64> {
        triangle_hit_parameter(&self.origin, self.direction.as_ref(), &tri[0], &tri[1], &tri[2])
    }

    /// Closest hit among a set of triangles: `(index, t)`.
    pub fn closest_triangle(&self, triangles: &[[Point3; 3]]) -> Option<(usize, f64)> {
        triangles
            .iter()
            .enumerate()
            .filter_map(|(i, tri)| self.intersect_triangle(tri).map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
