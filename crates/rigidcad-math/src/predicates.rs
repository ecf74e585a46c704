//! Pure geometric predicates and constructions.
//!
//! Every comparison uses [`EPSILON`]. Angular tests compare normalized
//! directions, and plane degeneracy is measured relative to the lengths of
//! the spanning edges, so they hold at any model scale. Only point
//! coincidence uses [`EPSILON`] as an absolute distance.

use std::cmp::Ordering;

use crate::{Point3, Transform, Vec3, EPSILON};

/// Whether two vectors are parallel (or anti-parallel).
///
/// A vector shorter than [`EPSILON`] is parallel to everything.
pub fn is_parallel(a: &Vec3, b: &Vec3) -> bool {
    let (la, lb) = (a.norm(), b.norm());
    if la < EPSILON || lb < EPSILON {
        return true;
    }
    (a / la).cross(&(b / lb)).norm() < EPSILON
}

/// Whether two vectors are perpendicular.
///
/// A zero vector is perpendicular to everything.
pub fn is_perpendicular(a: &Vec3, b: &Vec3) -> bool {
    a.dot(b).abs() <= EPSILON * a.norm() * b.norm()
}

/// Whether all points lie on one line.
///
/// Sets of two or fewer points are always collinear, as are sets whose
/// points all coincide.
pub fn collinear(points: &[Point3]) -> bool {
    if points.len() < 3 {
        return true;
    }
    let p0 = points[0];
    let Some(dir) = points.iter().map(|p| p - p0).find(|v| v.norm() >= EPSILON) else {
        return true;
    };
    points.iter().all(|p| is_parallel(&dir, &(p - p0)))
}

/// First triple of points that does not lie on one line.
///
/// The first point of the set is always the first point of the triple.
pub fn noncollinear_points(points: &[Point3]) -> Option<[Point3; 3]> {
    let p0 = *points.first()?;
    let p1 = *points.iter().find(|p| (*p - p0).norm() >= EPSILON)?;
    let dir = p1 - p0;
    let p2 = *points.iter().find(|p| !is_parallel(&dir, &(*p - p0)))?;
    Some([p0, p1, p2])
}

/// Normal of the plane through three points: `(p1 - p0) × (p2 - p0)`.
///
/// Not normalized. Zero when the points are collinear.
pub fn plane_normal(p0: &Point3, p1: &Point3, p2: &Point3) -> Vec3 {
    (p1 - p0).cross(&(p2 - p0))
}

/// Whether all points lie on one plane.
///
/// Collinear sets are trivially coplanar. A point is on the plane when the
/// normal it spans with the first two reference points is either tiny
/// relative to `|b - a| * |p - a|` or parallel to the reference normal.
pub fn coplanar(points: &[Point3]) -> bool {
    let Some([a, b, c]) = noncollinear_points(points) else {
        return true;
    };
    let reference = plane_normal(&a, &b, &c).normalize();
    let ab = b - a;
    points.iter().all(|p| {
        let ap = p - a;
        let n = ab.cross(&ap);
        let len = n.norm();
        len <= EPSILON * ab.norm() * ap.norm() || reference.cross(&(n / len)).norm() < EPSILON
    })
}

/// Per-axis scale factors of a transform.
pub fn matrix_scale(t: &Transform) -> Vec3 {
    Vec3::new(t.xaxis().norm(), t.yaxis().norm(), t.zaxis().norm())
}

/// Whether the transform mirrors an odd number of axes.
pub fn is_flipped(t: &Transform) -> bool {
    t.xaxis().cross(&t.yaxis()).dot(&t.zaxis()) < 0.0
}

/// Whether the transform's axes are pairwise perpendicular (no shear).
pub fn is_uniform(t: &Transform) -> bool {
    let (x, y, z) = (t.xaxis(), t.yaxis(), t.zaxis());
    is_perpendicular(&x, &y) && is_perpendicular(&y, &z) && is_perpendicular(&x, &z)
}

/// The transform with its scale removed.
///
/// Axes are normalized, the origin and any reflection are kept. Axes
/// shorter than [`EPSILON`] are left untouched.
pub fn extract_matrix_scale(t: &Transform) -> Transform {
    let unit = |v: Vec3| {
        let len = v.norm();
        if len < EPSILON {
            v
        } else {
            v / len
        }
    };
    Transform::from_axes(
        &unit(t.xaxis()),
        &unit(t.yaxis()),
        &unit(t.zaxis()),
        &t.origin(),
    )
}

/// Average of a set of points.
pub fn centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Order the points of a planar convex polygon counter-clockwise.
///
/// Winding is counter-clockwise about the normal of the first non-collinear
/// triple of the input. Collinear input is returned unchanged.
pub fn sort_polygon_points(points: &[Point3]) -> Vec<Point3> {
    let (Some(center), Some([a, b, c])) = (centroid(points), noncollinear_points(points)) else {
        return points.to_vec();
    };
    let normal = plane_normal(&a, &b, &c).normalize();
    let Some(reference) = points.iter().map(|p| p - center).find(|v| v.norm() >= EPSILON)
    else {
        return points.to_vec();
    };

    let angle = |p: &Point3| {
        let v = p - center;
        let a = reference.cross(&v).dot(&normal).atan2(reference.dot(&v));
        if a < 0.0 {
            a + std::f64::consts::TAU
        } else {
            a
        }
    };

    let mut keyed: Vec<(f64, Point3)> = points.iter().map(|p| (angle(p), *p)).collect();
    keyed.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(Ordering::Equal));
    keyed.into_iter().map(|(_, p)| p).collect()
}

/// Ray parameter of a two-sided Möller–Trumbore hit, if any.
pub(crate) fn triangle_hit_parameter(
    origin: &Point3,
    dir: &Vec3,
    p0: &Point3,
    p1: &Point3,
    p2: &Point3,
) -> Option<f64> {
    let e1 = p1 - p0;
    let e2 = p2 - p0;
    let h = dir.cross(&e2);
    let det = e1.dot(&h);
    // Ray parallel to the triangle plane; sign of det is not checked (two-sided)
    if det.abs() < EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - p0;
    let u = inv * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = inv * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = inv * e2.dot(&q);
    (t > EPSILON).then_some(t)
}

/// Intersect a forward ray with a triangle, hitting either face.
///
/// Returns the hit point, or `None` when the ray misses, runs parallel to
/// the triangle, or the triangle lies behind the origin.
pub fn ray_triangle_intersect(
    origin: &Point3,
    dir: &Vec3,
    p0: &Point3,
    p1: &Point3,
    p2: &Point3,
) -> Option<Point3> {
    triangle_hit_parameter(origin, dir, p0, p1, p2).map(|t| origin + dir * t)
}
