use crate::math::intersect_2d::cross_2d;
use crate::math::polygon_2d::{classify_point_in_loops, Containment};
use crate::math::{Point2, Vector2};

/// Parameter spans where the line `origin + t * dir` lies inside or on the
/// region bounded by `loops`. `dir` must be unit length.
///
/// Spans come back sorted and merged. A span with `start == end` marks a
/// point where the line only touches the region.
#[must_use]
pub fn line_intervals(loops: &[Vec<Point2>], origin: &Point2, dir: &Vector2, eps: f64) -> Vec<(f64, f64)> {
    let at = |p: &Point2| (p - origin).dot(dir);
    let side = |p: &Point2| cross_2d(dir, &(p - origin));

    let mut params: Vec<f64> = Vec::new();
    for lp in loops {
        let n = lp.len();
        for i in 0..n {
            let (a, b) = (&lp[i], &lp[(i + 1) % n]);
            let (da, db) = (side(a), side(b));
            if da.abs() <= eps {
                params.push(at(a));
            }
            if db.abs() <= eps {
                params.push(at(b));
            }
            if (da > eps && db < -eps) || (da < -eps && db > eps) {
                let crossing = a + (b - a) * (da / (da - db));
                params.push(at(&crossing));
            }
        }
    }
    params.sort_by(f64::total_cmp);
    params.dedup_by(|a, b| (*a - *b).abs() <= eps);

    let inside = |t: f64| classify_point_in_loops(&(origin + dir * t), loops, eps) != Containment::Outside;

    let mut spans: Vec<(f64, f64)> = Vec::new();
    for pair in params.windows(2) {
        let (t0, t1) = (pair[0], pair[1]);
        if !inside(0.5 * (t0 + t1)) {
            continue;
        }
        match spans.last_mut() {
            Some(last) if (last.1 - t0).abs() <= eps => last.1 = t1,
            _ => spans.push((t0, t1)),
        }
    }

    // Touch points: crossings of the boundary not covered by any span.
    for &t in &params {
        let covered = spans.iter().any(|&(s, e)| t >= s - eps && t <= e + eps);
        if !covered && inside(t) {
            spans.push((t, t));
        }
    }
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));
    spans
}
