use crate::error::Result;
use crate::math::intersect_3d::{line_plane_intersect, LinePlaneRelation};
use crate::math::polygon_2d::Containment;
use crate::math::{Point3, Tolerance};
use crate::topology::{EdgeId, FaceId, Model};

use super::face_face::spans_on;
use super::frame::FaceFrame;

/// How an edge meets a planar face.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeFaceIntersection {
    Disjoint,
    /// The edge pierces (or ends on) the face; `t` is the distance from the
    /// edge's first vertex.
    Point { point: Point3, t: f64 },
    /// The edge lies in the face plane; the spans of it that cover the face,
    /// as distances from the first vertex.
    InPlane(Vec<(f64, f64)>),
}

/// Computes where an edge meets a face.
///
/// # Errors
///
/// Returns `EntityNotFound` if the edge, the face or a link below them is stale.
pub fn intersect_edge_face(model: &Model, e: EdgeId, f: FaceId, tol: &Tolerance) -> Result<EdgeFaceIntersection> {
    let (va, vb) = model.edge_vertices(e)?;
    let a = model.vertex(va)?.point;
    let b = model.vertex(vb)?.point;
    let len = (b - a).norm();
    if len <= tol.dist() {
        return Ok(EdgeFaceIntersection::Disjoint);
    }
    let dir = (b - a) / len;
    let frame = FaceFrame::new(model, f)?;

    let hit = match line_plane_intersect(&a, &dir, frame.plane(), tol) {
        LinePlaneRelation::Parallel => EdgeFaceIntersection::Disjoint,
        LinePlaneRelation::Point { point, t } => {
            if t < -tol.dist() || t > len + tol.dist() || frame.contains(&point, tol.dist()) == Containment::Outside {
                EdgeFaceIntersection::Disjoint
            } else {
                EdgeFaceIntersection::Point {
                    point,
                    t: t.clamp(0.0, len),
                }
            }
        }
        LinePlaneRelation::OnPlane => {
            let spans: Vec<(f64, f64)> = spans_on(&frame, &a, &dir, tol)
                .into_iter()
                .filter(|&(s, e)| e >= -tol.dist() && s <= len + tol.dist())
                .map(|(s, e)| (s.max(0.0), e.min(len)))
                .collect();
            if spans.is_empty() {
                EdgeFaceIntersection::Disjoint
            } else {
                EdgeFaceIntersection::InPlane(spans)
            }
        }
    };
    Ok(hit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeFace;
    use crate::topology::{Corner, ShellId};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn setup() -> (Model, ShellId, FaceId) {
        let mut model = Model::new();
        let r = model.make_region();
        let s = model.make_shell(r).unwrap();
        let fu = MakeFace::from_points(vec![p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 2.0, 0.0), p(0.0, 2.0, 0.0)])
            .execute(&mut model, s)
            .unwrap();
        let f = model.face_use(fu).unwrap().face;
        (model, s, f)
    }

    fn wire(model: &mut Model, s: ShellId, a: Point3, b: Point3) -> EdgeId {
        let eu = model.make_wire_edge(s, Corner::Point(a), Corner::Point(b)).unwrap();
        model.edge_use(eu).unwrap().edge
    }

    #[test]
    fn edge_pierces_face() {
        let (mut model, s, f) = setup();
        let e = wire(&mut model, s, p(1.0, 1.0, -1.0), p(1.0, 1.0, 3.0));
        match intersect_edge_face(&model, e, f, &Tolerance::default()).unwrap() {
            EdgeFaceIntersection::Point { point, t } => {
                assert!((point - p(1.0, 1.0, 0.0)).norm() < 1e-12);
                assert!((t - 1.0).abs() < 1e-12);
            }
            other => panic!("expected a point, got {other:?}"),
        }
    }

    #[test]
    fn edge_misses_face() {
        let (mut model, s, f) = setup();
        let e = wire(&mut model, s, p(5.0, 1.0, -1.0), p(5.0, 1.0, 1.0));
        assert_eq!(
            intersect_edge_face(&model, e, f, &Tolerance::default()).unwrap(),
            EdgeFaceIntersection::Disjoint
        );
        let short = wire(&mut model, s, p(1.0, 1.0, 1.0), p(1.0, 1.0, 2.0));
        assert_eq!(
            intersect_edge_face(&model, short, f, &Tolerance::default()).unwrap(),
            EdgeFaceIntersection::Disjoint
        );
    }

    #[test]
    fn edge_in_plane_is_clipped() {
        let (mut model, s, f) = setup();
        let e = wire(&mut model, s, p(-1.0, 1.0, 0.0), p(1.0, 1.0, 0.0));
        match intersect_edge_face(&model, e, f, &Tolerance::default()).unwrap() {
            EdgeFaceIntersection::InPlane(spans) => {
                assert_eq!(spans.len(), 1);
                assert!((spans[0].0 - 1.0).abs() < 1e-9);
                assert!((spans[0].1 - 2.0).abs() < 1e-9);
            }
            other => panic!("expected in-plane spans, got {other:?}"),
        }
    }
}
