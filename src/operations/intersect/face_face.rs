use crate::error::Result;
use crate::math::intersect_3d::{plane_plane_intersect, PlanePairRelation};
use crate::math::{Point3, Tolerance, Vector3};
use crate::topology::{FaceId, Model};

use super::frame::FaceFrame;
use super::intervals::line_intervals;

/// A straight piece of an intersection curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3,
    pub end: Point3,
}

impl Segment {
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// How two planar faces meet.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceFaceIntersection {
    /// The faces do not meet.
    Disjoint,
    /// The faces lie in one plane; `same_normal` compares their outward normals.
    Coplanar { same_normal: bool },
    /// The faces only graze each other at one point.
    Tangent { point: Point3 },
    /// The pieces of the plane/plane line that lie on both faces.
    Segments(Vec<Segment>),
}

/// Computes how two planar faces intersect.
///
/// The faces' bounding boxes are tested first. Otherwise the planes are
/// intersected, the line is projected into each face's own plane frame and
/// clipped against its loops, and the two sets of spans are overlapped.
///
/// # Errors
///
/// Returns `EntityNotFound` if either face or a link below it is stale.
pub fn intersect_faces(model: &Model, fa: FaceId, fb: FaceId, tol: &Tolerance) -> Result<FaceFaceIntersection> {
    if !model.face_bbox(fa)?.overlaps(&model.face_bbox(fb)?, tol.dist()) {
        return Ok(FaceFaceIntersection::Disjoint);
    }
    let a = FaceFrame::new(model, fa)?;
    let b = FaceFrame::new(model, fb)?;
    Ok(intersect_frames(&a, &b, tol))
}

/// [`intersect_faces`] over faces that are already projected.
#[must_use]
pub fn intersect_frames(a: &FaceFrame, b: &FaceFrame, tol: &Tolerance) -> FaceFaceIntersection {
    let (origin, dir) = match plane_plane_intersect(a.plane(), b.plane(), tol) {
        PlanePairRelation::IntersectionLine { origin, direction } => (origin, direction),
        PlanePairRelation::Parallel { .. } => return FaceFaceIntersection::Disjoint,
        PlanePairRelation::Coincident { .. } => {
            return FaceFaceIntersection::Coplanar {
                same_normal: a.normal().dot(&b.normal()) > 0.0,
            };
        }
    };

    let spans_a = spans_on(a, &origin, &dir, tol);
    let spans_b = spans_on(b, &origin, &dir, tol);

    let mut segments = Vec::new();
    let mut touch = None;
    for &(a0, a1) in &spans_a {
        for &(b0, b1) in &spans_b {
            let start = a0.max(b0);
            let end = a1.min(b1);
            if end - start > tol.dist() {
                segments.push(Segment::new(origin + dir * start, origin + dir * end));
            } else if end - start >= -tol.dist() {
                touch = Some(origin + dir * (0.5 * (start + end)));
            }
        }
    }

    match (segments.is_empty(), touch) {
        (false, _) => FaceFaceIntersection::Segments(segments),
        (true, Some(point)) => FaceFaceIntersection::Tangent { point },
        (true, None) => FaceFaceIntersection::Disjoint,
    }
}

/// Spans of the 3D line `origin + t * dir` (unit `dir`, lying in the face
/// plane) that fall on the face, in the line's own parameter.
pub(crate) fn spans_on(frame: &FaceFrame, origin: &Point3, dir: &Vector3, tol: &Tolerance) -> Vec<(f64, f64)> {
    let o = frame.to_2d(origin);
    let d = frame.vector_to_2d(dir);
    let len = d.norm();
    if len <= tol.perp() {
        return Vec::new();
    }
    // In-plane lines keep their length; rescale anyway for lines that are
    // only within tolerance of the plane.
    line_intervals(frame.loops(), &o, &(d / len), tol.dist())
        .into_iter()
        .map(|(s, e)| (s / len, e / len))
        .collect()
}
