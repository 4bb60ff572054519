use super::{Point3, Vector3};

/// Newell normal of a closed polygon.
///
/// Its length is twice the enclosed area and it points the way a
/// counter-clockwise traversal faces.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let n = points.len();
    (0..n).fold(Vector3::zeros(), |acc, i| {
        let a = points[i].coords;
        let b = points[(i + 1) % n].coords;
        acc + a.cross(&b)
    })
}

/// Signed area of a planar polygon seen from `normal` (unit length).
///
/// Positive when the polygon winds counter-clockwise about `normal`.
#[must_use]
pub fn signed_area_3d(points: &[Point3], normal: &Vector3) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    0.5 * newell_normal(points).dot(normal)
}
