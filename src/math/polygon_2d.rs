use super::intersect_2d::{cross_2d, point_segment_distance_2d};
use super::Point2;

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Length of a closed polygon's boundary.
#[must_use]
pub fn perimeter_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    (0..n).map(|i| (points[(i + 1) % n] - points[i]).norm()).sum()
}

/// Where a point lies relative to a region bounded by loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    /// Within the distance epsilon of a boundary segment.
    On,
    Outside,
}

/// Classifies `p` against the region bounded by `loops` (outer loop and holes,
/// any winding), using the even-odd rule.
#[must_use]
pub fn classify_point_in_loops(p: &Point2, loops: &[Vec<Point2>], eps: f64) -> Containment {
    let mut crossings = 0usize;
    for lp in loops {
        let n = lp.len();
        for i in 0..n {
            let a = &lp[i];
            let b = &lp[(i + 1) % n];
            if point_segment_distance_2d(p, a, b).0 <= eps {
                return Containment::On;
            }
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if x > p.x {
                    crossings += 1;
                }
            }
        }
    }
    if crossings % 2 == 1 {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// Winding number of `p` with respect to a closed polygon.
///
/// Non-zero means inside.
#[must_use]
pub fn winding_number_2d(p: &Point2, polygon: &[Point2]) -> i32 {
    let n = polygon.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        let side = cross_2d(&(b - a), &(p - a));
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Finds a point strictly inside the region bounded by `loops`, as far from
/// the boundary as a horizontal scanline search allows.
///
/// Scanlines are placed halfway between consecutive distinct vertex heights;
/// each is cut by the loop segments, the inside spans are paired up with the
/// even-odd rule and the span with the best clearance wins. Returns `None` if
/// the region has no interior wider than `eps`.
#[must_use]
pub fn interior_point(loops: &[Vec<Point2>], eps: f64) -> Option<Point2> {
    let mut heights: Vec<f64> = loops.iter().flatten().map(|p| p.y).collect();
    heights.sort_by(f64::total_cmp);
    heights.dedup_by(|a, b| (*a - *b).abs() <= eps);

    let mut best: Option<(f64, Point2)> = None;
    for pair in heights.windows(2) {
        let y = 0.5 * (pair[0] + pair[1]);
        let half_gap = 0.5 * (pair[1] - pair[0]);

        let mut xs = Vec::new();
        for lp in loops {
            let n = lp.len();
            for i in 0..n {
                let a = &lp[i];
                let b = &lp[(i + 1) % n];
                if (a.y > y) != (b.y > y) {
                    xs.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
        }
        xs.sort_by(f64::total_cmp);

        for span in xs.chunks_exact(2) {
            let half_width = 0.5 * (span[1] - span[0]);
            let score = half_width.min(half_gap);
            if score <= eps {
                continue;
            }
            if best.is_none_or(|(s, _)| score > s) {
                best = Some((score, Point2::new(0.5 * (span[0] + span[1]), y)));
            }
        }
    }
    best.map(|(_, p)| p)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2> {
        vec![
            p(x0, y0),
            p(x0 + size, y0),
            p(x0 + size, y0 + size),
            p(x0, y0 + size),
        ]
    }

    #[test]
    fn perimeter_of_square() {
        assert!((perimeter_2d(&square(0.0, 0.0, 2.0)) - 8.0).abs() < 1e-12);
        assert!(perimeter_2d(&[]).abs() < 1e-12);
    }

    #[test]
    fn area_sign_follows_winding() {
        let ccw = square(0.0, 0.0, 2.0);
        let cw: Vec<Point2> = ccw.iter().rev().copied().collect();
        assert!((signed_area_2d(&ccw) - 4.0).abs() < 1e-12);
        assert!((signed_area_2d(&cw) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn containment_with_hole() {
        let loops = vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 2.0)];
        assert_eq!(classify_point_in_loops(&p(0.5, 0.5), &loops, 1e-9), Containment::Inside);
        assert_eq!(classify_point_in_loops(&p(2.0, 2.0), &loops, 1e-9), Containment::Outside);
        assert_eq!(classify_point_in_loops(&p(1.0, 2.0), &loops, 1e-9), Containment::On);
        assert_eq!(classify_point_in_loops(&p(5.0, 2.0), &loops, 1e-9), Containment::Outside);
    }

    #[test]
    fn winding_number_of_square() {
        let sq = square(0.0, 0.0, 1.0);
        assert_eq!(winding_number_2d(&p(0.5, 0.5), &sq), 1);
        assert_eq!(winding_number_2d(&p(1.5, 0.5), &sq), 0);
    }

    #[test]
    fn interior_point_avoids_hole() {
        let loops = vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 2.0)];
        let q = interior_point(&loops, 1e-9).unwrap();
        assert_eq!(classify_point_in_loops(&q, &loops, 1e-3), Containment::Inside);
    }

    #[test]
    fn interior_point_of_l_shape() {
        let l = vec![
            p(0.0, 0.0),
            p(3.0, 0.0),
            p(3.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 3.0),
            p(0.0, 3.0),
        ];
        let q = interior_point(&[l.clone()], 1e-9).unwrap();
        assert_eq!(winding_number_2d(&q, &l), 1);
    }

    #[test]
    fn sliver_has_no_interior() {
        let sliver = vec![p(0.0, 0.0), p(1.0, 0.0), p(0.5, 1e-12)];
        assert!(interior_point(&[sliver], 1e-9).is_none());
    }
}
