#![warn(missing_docs)]

//! Geometry kernel for rigidcad.
//!
//! Thin wrappers around nalgebra providing the point, vector and transform
//! types shared by the scene and collision crates, the single tolerance
//! constant [`EPSILON`], and the pure predicates used to validate collision
//! input (collinearity, coplanarity, flipped or sheared transforms, ray
//! casting).

mod bbox;
mod predicates;
mod ray;

pub use bbox::BoundingBox;
pub use predicates::{
    centroid, collinear, coplanar, extract_matrix_scale, is_flipped, is_parallel,
    is_perpendicular, is_uniform, matrix_scale, noncollinear_points, plane_normal,
    ray_triangle_intersect, sort_polygon_points,
};
pub use ray::Ray;

use nalgebra::{Matrix4, Unit, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// Tolerance used by every geometric comparison in rigidcad.
///
/// Lengths, extents, scale factors, cross and dot products are all compared
/// against this one value.
pub const EPSILON: f64 = 1e-6;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 4x4 affine transformation matrix.
///
/// Columns 0..3 of the upper-left 3x3 block are the images of the X, Y and Z
/// unit vectors; column 3 is the origin. Serialized as 16 numbers in
/// row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 16]", into = "[f64; 16]")]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(1, 1)] = c;
        m[(1, 2)] = -s;
        m[(2, 1)] = s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Build a transform from its basis vectors and origin.
    ///
    /// The axes are used as given: they are neither normalized nor
    /// orthogonalized, so scaled, sheared and mirrored frames can be built.
    pub fn from_axes(xaxis: &Vec3, yaxis: &Vec3, zaxis: &Vec3, origin: &Point3) -> Self {
        let mut m = Matrix4::identity();
        for (col, axis) in [xaxis, yaxis, zaxis].into_iter().enumerate() {
            m[(0, col)] = axis.x;
            m[(1, col)] = axis.y;
            m[(2, col)] = axis.z;
        }
        m[(0, 3)] = origin.x;
        m[(1, 3)] = origin.y;
        m[(2, 3)] = origin.z;
        Self { matrix: m }
    }

    /// Image of the origin.
    pub fn origin(&self) -> Point3 {
        Point3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// Image of the X unit vector (not normalized).
    pub fn xaxis(&self) -> Vec3 {
        self.column(0)
    }

    /// Image of the Y unit vector (not normalized).
    pub fn yaxis(&self) -> Vec3 {
        self.column(1)
    }

    /// Image of the Z unit vector (not normalized).
    pub fn zaxis(&self) -> Vec3 {
        self.column(2)
    }

    fn column(&self, col: usize) -> Vec3 {
        Vec3::new(
            self.matrix[(0, col)],
            self.matrix[(1, col)],
            self.matrix[(2, col)],
        )
    }

    /// Whether this is the identity within [`EPSILON`].
    pub fn is_identity(&self) -> bool {
        (self.matrix - Matrix4::identity()).abs().max() < EPSILON
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// Applying the result to a point applies `other` first, then `self`,
    /// which is how a parent frame composes with a child's local frame.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 16]> for Transform {
    fn from(values: [f64; 16]) -> Self {
        Self {
            matrix: Matrix4::from_row_slice(&values),
        }
    }
}

impl From<Transform> for [f64; 16] {
    fn from(t: Transform) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = t.matrix[(row, col)];
            }
        }
        out
    }
}
