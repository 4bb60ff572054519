use crate::geometry::Plane;

use super::{Point3, Tolerance, Vector3};

/// Relationship between two planes.
#[derive(Debug)]
pub enum PlanePairRelation {
    /// Planes intersect along a line.
    IntersectionLine {
        origin: Point3,
        direction: Vector3,
    },
    /// Planes are parallel but not coincident.
    Parallel { distance: f64 },
    /// Planes are the same (coincident), with normals pointing the same way or not.
    Coincident { same_normal: bool },
}

/// Computes the intersection of two planes.
///
/// The line direction is `a.normal × b.normal`, normalized. Planes whose
/// normals are parallel within `tol.para()` are treated as parallel.
#[must_use]
pub fn plane_plane_intersect(a: &Plane, b: &Plane, tol: &Tolerance) -> PlanePairRelation {
    let na = a.normal();
    let nb = b.normal();

    if tol.parallel(na, nb) {
        let dist = (b.origin() - a.origin()).dot(na).abs();
        return if dist <= tol.dist() {
            PlanePairRelation::Coincident {
                same_normal: na.dot(nb) > 0.0,
            }
        } else {
            PlanePairRelation::Parallel { distance: dist }
        };
    }

    let dir = na.cross(nb).normalize();

    // p = oa + s * na + t * nb, solved against both plane equations.
    let d2 = nb.dot(&(b.origin() - a.origin()));
    let dot_nn = na.dot(nb);
    let denom = 1.0 - dot_nn * dot_nn;
    let s = -dot_nn * d2 / denom;
    let t = d2 / denom;
    let origin = a.origin() + na * s + nb * t;

    PlanePairRelation::IntersectionLine {
        origin,
        direction: dir,
    }
}

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line `origin + t * dir` with a plane.
///
/// `dir` must be a unit vector; the line is parallel when the cosine between
/// `dir` and the plane normal is below `tol.perp()`.
#[must_use]
pub fn line_plane_intersect(
    origin: &Point3,
    dir: &Vector3,
    plane: &Plane,
    tol: &Tolerance,
) -> LinePlaneRelation {
    let normal = plane.normal();
    let denom = normal.dot(dir);
    let numer = normal.dot(&(plane.origin() - origin));

    if denom.abs() <= tol.perp() {
        if numer.abs() <= tol.dist() {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        LinePlaneRelation::Point {
            point: origin + dir * t,
            t,
        }
    }
}

/// Signed distance from a point to a plane.
/// Positive = on the normal side, negative = opposite.
#[must_use]
pub fn signed_distance_to_plane(point: &Point3, plane: &Plane) -> f64 {
    plane.normal().dot(&(point - plane.origin()))
}

/// Closest approach of two 3D segments `a0..a1` and `b0..b1`.
///
/// Returns `(sa, sb, distance)` with `sa`, `sb` the clamped `[0, 1]` parameters
/// of the closest points, or `None` if the segments are parallel.
#[must_use]
pub fn segment_segment_closest(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
    tol: &Tolerance,
) -> Option<(f64, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let la = da.norm();
    let lb = db.norm();
    if la <= tol.dist() || lb <= tol.dist() {
        return None;
    }
    let ua = da / la;
    let ub = db / lb;
    if tol.parallel(&ua, &ub) {
        return None;
    }

    let w = a0 - b0;
    let a = da.dot(&da);
    let b = da.dot(&db);
    let c = db.dot(&db);
    let d = da.dot(&w);
    let e = db.dot(&w);
    let denom = a * c - b * b;

    let mut sa = ((b * e - c * d) / denom).clamp(0.0, 1.0);
    let mut sb = (b * sa + e) / c;
    if sb < 0.0 {
        sb = 0.0;
        sa = (-d / a).clamp(0.0, 1.0);
    } else if sb > 1.0 {
        sb = 1.0;
        sa = ((b - d) / a).clamp(0.0, 1.0);
    }

    let pa = a0 + da * sa;
    let pb = b0 + db * sb;
    Some((sa, sb, (pa - pb).norm()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    // ── plane_plane_intersect ──

    #[test]
    fn perpendicular_planes_intersect() {
        let xy = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let xz = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 1.0, 0.0)).unwrap();

        match plane_plane_intersect(&xy, &xz, &tol()) {
            PlanePairRelation::IntersectionLine { direction, .. } => {
                assert!(
                    direction.x.abs() > 0.99,
                    "expected X-axis direction, got {direction:?}"
                );
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn intersection_point_lies_on_both_planes() {
        let a = Plane::from_normal(p(1.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        let b = Plane::from_normal(p(0.0, 2.0, 0.0), v(0.0, 1.0, 1.0)).unwrap();

        match plane_plane_intersect(&a, &b, &tol()) {
            PlanePairRelation::IntersectionLine { origin, .. } => {
                assert!(signed_distance_to_plane(&origin, &a).abs() < 1e-12);
                assert!(signed_distance_to_plane(&origin, &b).abs() < 1e-12);
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn parallel_planes() {
        let a = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(p(0.0, 0.0, 5.0), v(0.0, 0.0, -1.0)).unwrap();

        match plane_plane_intersect(&a, &b, &tol()) {
            PlanePairRelation::Parallel { distance } => {
                assert!((distance - 5.0).abs() < 1e-12);
            }
            other => panic!("expected Parallel, got {other:?}"),
        }
    }

    #[test]
    fn coincident_planes_report_normal_sense() {
        let a = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(p(1.0, 2.0, 0.0), v(0.0, 0.0, -1.0)).unwrap();

        assert!(matches!(
            plane_plane_intersect(&a, &b, &tol()),
            PlanePairRelation::Coincident { same_normal: false }
        ));
    }

    // ── line_plane_intersect ──

    #[test]
    fn line_hits_plane() {
        let plane = Plane::from_normal(p(0.0, 0.0, 5.0), v(0.0, 0.0, 1.0)).unwrap();
        match line_plane_intersect(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0), &plane, &tol()) {
            LinePlaneRelation::Point { point, t } => {
                assert!((t - 5.0).abs() < 1e-12);
                assert!((point.z - 5.0).abs() < 1e-12);
            }
            other => panic!("expected Point, got {other:?}"),
        }
    }

    #[test]
    fn line_parallel_or_on_plane() {
        let plane = Plane::from_normal(p(0.0, 0.0, 5.0), v(0.0, 0.0, 1.0)).unwrap();
        let dir = v(1.0, 0.0, 0.0);
        assert!(matches!(
            line_plane_intersect(&p(0.0, 0.0, 0.0), &dir, &plane, &tol()),
            LinePlaneRelation::Parallel
        ));
        assert!(matches!(
            line_plane_intersect(&p(1.0, 2.0, 5.0), &dir, &plane, &tol()),
            LinePlaneRelation::OnPlane
        ));
    }

    // ── segment_segment_closest ──

    #[test]
    fn crossing_segments_meet() {
        let (sa, sb, d) = segment_segment_closest(
            &p(0.0, 0.0, 0.0),
            &p(2.0, 0.0, 0.0),
            &p(1.0, -1.0, 0.0),
            &p(1.0, 1.0, 0.0),
            &tol(),
        )
        .unwrap();
        assert!((sa - 0.5).abs() < 1e-12);
        assert!((sb - 0.5).abs() < 1e-12);
        assert!(d < 1e-12);
    }

    #[test]
    fn skew_segments_keep_distance() {
        let (_, _, d) = segment_segment_closest(
            &p(0.0, 0.0, 0.0),
            &p(2.0, 0.0, 0.0),
            &p(1.0, -1.0, 1.0),
            &p(1.0, 1.0, 1.0),
            &tol(),
        )
        .unwrap();
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_segments_have_no_closest_pair() {
        assert!(segment_segment_closest(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
            &p(1.0, 1.0, 0.0),
            &tol(),
        )
        .is_none());
    }
}
