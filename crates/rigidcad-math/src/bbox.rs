//! Axis-aligned bounding box accumulated from vertex scans.

use crate::{Point3, Vec3, EPSILON};

/// Axis-aligned bounding box in 3D.
///
/// Starts empty (inverted) and grows with [`BoundingBox::include_point`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox {
    /// Create a box from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing all points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.include_point(p);
        }
        bb
    }

    /// Whether no point has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this box to include another box.
    pub fn merge(&mut self, other: &BoundingBox) {
        if !other.is_empty() {
            self.include_point(&other.min);
            self.include_point(&other.max);
        }
    }

    /// Extent along X. Zero for an empty box.
    pub fn width(&self) -> f64 {
        (self.max.x - self.min.x).max(0.0)
    }

    /// Extent along Y. Zero for an empty box.
    pub fn height(&self) -> f64 {
        (self.max.y - self.min.y).max(0.0)
    }

    /// Extent along Z. Zero for an empty box.
    pub fn depth(&self) -> f64 {
        (self.max.z - self.min.z).max(0.0)
    }

    /// `(width, height, depth)` as a vector.
    pub fn extents(&self) -> Vec3 {
        Vec3::new(self.width(), self.height(), self.depth())
    }

    /// Midpoint of the two corners.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Whether any extent is at or below [`EPSILON`].
    ///
    /// Empty boxes are flat.
    pub fn is_flat(&self) -> bool {
        self.width() <= EPSILON || self.height() <= EPSILON || self.depth() <= EPSILON
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}
