use crate::error::Result;
use crate::math::intersect_3d::segment_segment_closest;
use crate::math::{Point3, Tolerance};
use crate::topology::{EdgeId, Model};

/// How two edges meet.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeEdgeIntersection {
    Disjoint,
    /// The edges cross or touch; `ta` and `tb` are fractions along each edge.
    Point { point: Point3, ta: f64, tb: f64 },
    /// The edges are collinear and share a stretch of positive length.
    Overlap { start: Point3, end: Point3 },
}

/// Computes where two edges meet.
///
/// # Errors
///
/// Returns `EntityNotFound` if either edge or its vertices are stale.
pub fn intersect_edges(model: &Model, ea: EdgeId, eb: EdgeId, tol: &Tolerance) -> Result<EdgeEdgeIntersection> {
    let [a0, a1, b0, b1] = {
        let (va0, va1) = model.edge_vertices(ea)?;
        let (vb0, vb1) = model.edge_vertices(eb)?;
        [
            model.vertex(va0)?.point,
            model.vertex(va1)?.point,
            model.vertex(vb0)?.point,
            model.vertex(vb1)?.point,
        ]
    };
    Ok(intersect_segments(&a0, &a1, &b0, &b1, tol))
}

/// [`intersect_edges`] over raw segment end points.
#[must_use]
pub fn intersect_segments(a0: &Point3, a1: &Point3, b0: &Point3, b1: &Point3, tol: &Tolerance) -> EdgeEdgeIntersection {
    if let Some((ta, tb, dist)) = segment_segment_closest(a0, a1, b0, b1, tol) {
        return if dist <= tol.dist() {
            let pa = a0 + (a1 - a0) * ta;
            let pb = b0 + (b1 - b0) * tb;
            EdgeEdgeIntersection::Point {
                point: Point3::from((pa.coords + pb.coords) * 0.5),
                ta,
                tb,
            }
        } else {
            EdgeEdgeIntersection::Disjoint
        };
    }

    // Parallel (or degenerate): only collinear pairs can meet.
    let da = a1 - a0;
    let len = da.norm();
    if len <= tol.dist() {
        return EdgeEdgeIntersection::Disjoint;
    }
    let dir = da / len;
    let off_line = |p: &Point3| {
        let w = p - a0;
        (w - dir * w.dot(&dir)).norm()
    };
    if off_line(b0) > tol.dist() || off_line(b1) > tol.dist() {
        return EdgeEdgeIntersection::Disjoint;
    }

    let (s0, s1) = {
        let (t0, t1) = ((b0 - a0).dot(&dir), (b1 - a0).dot(&dir));
        (t0.min(t1).max(0.0), t0.max(t1).min(len))
    };
    if s1 - s0 > tol.dist() {
        EdgeEdgeIntersection::Overlap {
            start: a0 + dir * s0,
            end: a0 + dir * s1,
        }
    } else if s1 - s0 >= -tol.dist() {
        let t = 0.5 * (s0 + s1);
        let point = a0 + dir * t;
        let db = b1 - b0;
        let tb = if db.norm_squared() > 0.0 {
            (point - b0).dot(&db) / db.norm_squared()
        } else {
            0.0
        };
        EdgeEdgeIntersection::Point {
            point,
            ta: t / len,
            tb: tb.clamp(0.0, 1.0),
        }
    } else {
        EdgeEdgeIntersection::Disjoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    #[test]
    fn crossing_edges_meet_at_a_point() {
        match intersect_segments(&p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0), &p(1.0, -1.0, 0.0), &p(1.0, 1.0, 0.0), &tol()) {
            EdgeEdgeIntersection::Point { point, ta, tb } => {
                assert!((point - p(1.0, 0.0, 0.0)).norm() < 1e-12);
                assert!((ta - 0.5).abs() < 1e-12);
                assert!((tb - 0.5).abs() < 1e-12);
            }
            other => panic!("expected a point, got {other:?}"),
        }
    }

    #[test]
    fn skew_edges_do_not_meet() {
        assert_eq!(
            intersect_segments(&p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0), &p(1.0, -1.0, 1.0), &p(1.0, 1.0, 1.0), &tol()),
            EdgeEdgeIntersection::Disjoint
        );
    }

    #[test]
    fn collinear_edges_overlap() {
        match intersect_segments(&p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0), &p(3.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &tol()) {
            EdgeEdgeIntersection::Overlap { start, end } => {
                assert!((start - p(1.0, 0.0, 0.0)).norm() < 1e-12);
                assert!((end - p(2.0, 0.0, 0.0)).norm() < 1e-12);
            }
            other => panic!("expected an overlap, got {other:?}"),
        }
    }

    #[test]
    fn collinear_edges_touching_end_to_end() {
        match intersect_segments(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(2.0, 0.0, 0.0), &tol()) {
            EdgeEdgeIntersection::Point { ta, tb, .. } => {
                assert!((ta - 1.0).abs() < 1e-12);
                assert!(tb.abs() < 1e-12);
            }
            other => panic!("expected a point, got {other:?}"),
        }
    }

    #[test]
    fn parallel_offset_edges_are_disjoint() {
        assert_eq!(
            intersect_segments(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(0.0, 1.0, 0.0), &p(1.0, 1.0, 0.0), &tol()),
            EdgeEdgeIntersection::Disjoint
        );
    }
}
