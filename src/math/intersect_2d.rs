use super::{Point2, Vector2};

/// 2D cross product: `(a.x * b.y - a.y * b.x)`.
#[inline]
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are the clamped
/// `[0, 1]` parameters on `a0..a1` and `b0..b1`. Parallel and collinear
/// segments return `None`; callers handle overlap through point-on-segment
/// tests instead. `eps` is a distance, converted to a parameter slack per
/// segment.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    eps: f64,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let la = da.norm();
    let lb = db.norm();
    if la <= eps || lb <= eps {
        return None;
    }

    let cross = cross_2d(&da, &db);
    // sin of the angle between the segments
    if (cross / (la * lb)).abs() <= f64::EPSILON.sqrt() {
        return None;
    }

    let w = b0 - a0;
    let t = cross_2d(&w, &db) / cross;
    let u = cross_2d(&w, &da) / cross;

    let slack_a = eps / la;
    let slack_b = eps / lb;
    if t >= -slack_a && t <= 1.0 + slack_a && u >= -slack_b && u <= 1.0 + slack_b {
        let t = t.clamp(0.0, 1.0);
        Some((a0 + da * t, t, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Distance from `p` to the segment `a..b` and the clamped parameter of the
/// closest point.
#[must_use]
pub fn point_segment_distance_2d(p: &Point2, a: &Point2, b: &Point2) -> (f64, f64) {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq == 0.0 {
        return ((p - a).norm(), 0.0);
    }
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    ((p - (a + d * t)).norm(), t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn crossing_segments() {
        let (pt, t, u) =
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, -1.0), &p(1.0, 3.0), 1e-9)
                .unwrap();
        assert!((pt - p(1.0, 0.0)).norm() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
        assert!((u - 0.25).abs() < 1e-12);
    }

    #[test]
    fn touching_at_endpoint_counts() {
        let hit =
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0), 1e-9);
        assert!(hit.is_some());
    }

    #[test]
    fn disjoint_and_parallel_segments() {
        assert!(
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, -1.0), &p(2.0, 1.0), 1e-9)
                .is_none()
        );
        assert!(
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0), 1e-9)
                .is_none()
        );
    }

    #[test]
    fn point_segment_distance_clamps() {
        let (d, t) = point_segment_distance_2d(&p(3.0, 1.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!((t - 1.0).abs() < 1e-12);
        assert!((d - 2.0_f64.sqrt()).abs() < 1e-12);
    }
}
