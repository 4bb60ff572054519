//! Geometric intersection between the faces, wire edges and wire loops of
//! two shells.
//!
//! Everything here reads the model and never changes it, so face pairs are
//! intersected in parallel. The results feed the face cutter.

mod edge_edge;
mod edge_face;
mod face_face;
mod frame;
mod intervals;

pub use edge_edge::{intersect_edges, intersect_segments, EdgeEdgeIntersection};
pub use edge_face::{intersect_edge_face, EdgeFaceIntersection};
pub use face_face::{intersect_faces, intersect_frames, FaceFaceIntersection, Segment};
pub use frame::FaceFrame;
pub use intervals::line_intervals;

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::{Result, TopologyError};
use crate::math::{Point3, Tolerance};
use crate::topology::{EdgeId, FaceId, Model, ShellId};

use face_face::spans_on;

/// Everything two shells must absorb so they share edges along their
/// intersection.
#[derive(Debug, Default)]
pub struct ShellIntersection {
    /// Segments to insert into each face.
    pub cuts: HashMap<FaceId, Vec<Segment>>,
    /// Face pairs lying in one plane, with whether their normals agree.
    pub coplanar: Vec<(FaceId, FaceId, bool)>,
    /// Points that must become vertices of both shells.
    pub points: Vec<Point3>,
}

impl ShellIntersection {
    /// Number of cut segments over all faces.
    #[must_use]
    pub fn cut_count(&self) -> usize {
        self.cuts.values().map(Vec::len).sum()
    }
}

#[derive(Default)]
struct PairCuts {
    onto_a: Vec<Segment>,
    onto_b: Vec<Segment>,
    coplanar: Option<bool>,
    points: Vec<Point3>,
}

/// Intersects every face, wire edge and wire loop of `a` with those of `b`.
///
/// # Errors
///
/// Returns `EntityNotFound` if either shell or a link below it is stale.
pub fn intersect_shells(model: &Model, a: ShellId, b: ShellId, tol: &Tolerance) -> Result<ShellIntersection> {
    let frames_a = frames(model, a)?;
    let frames_b = frames(model, b)?;

    let pairs: Vec<(usize, usize)> = frames_a
        .iter()
        .enumerate()
        .flat_map(|(i, fa)| {
            frames_b
                .iter()
                .enumerate()
                .filter(|(_, fb)| fa.bbox().overlaps(fb.bbox(), tol.dist()))
                .map(move |(j, _)| (i, j))
        })
        .collect();

    let found: Vec<PairCuts> = pairs
        .par_iter()
        .map(|&(i, j)| pair_cuts(&frames_a[i], &frames_b[j], tol))
        .collect();

    let mut out = ShellIntersection::default();
    for (&(i, j), cut) in pairs.iter().zip(found) {
        let (fa, fb) = (frames_a[i].face(), frames_b[j].face());
        if let Some(same) = cut.coplanar {
            out.coplanar.push((fa, fb, same));
        }
        for seg in cut.onto_a.iter().chain(&cut.onto_b) {
            out.points.push(seg.start);
            out.points.push(seg.end);
        }
        out.points.extend(cut.points);
        if !cut.onto_a.is_empty() {
            out.cuts.entry(fa).or_default().extend(cut.onto_a);
        }
        if !cut.onto_b.is_empty() {
            out.cuts.entry(fb).or_default().extend(cut.onto_b);
        }
    }

    wire_points(model, a, &frames_b, b, tol, &mut out.points)?;
    wire_points(model, b, &frames_a, a, tol, &mut out.points)?;

    debug!(
        pairs = pairs.len(),
        cuts = out.cut_count(),
        coplanar = out.coplanar.len(),
        points = out.points.len(),
        "shells intersected"
    );
    Ok(out)
}

fn frames(model: &Model, s: ShellId) -> Result<Vec<FaceFrame>> {
    let faces = model.shell_faces(s)?;
    let frames = faces
        .par_iter()
        .map(|&f| FaceFrame::new(model, f))
        .collect::<Result<Vec<_>, TopologyError>>()?;
    Ok(frames)
}

fn pair_cuts(a: &FaceFrame, b: &FaceFrame, tol: &Tolerance) -> PairCuts {
    match intersect_frames(a, b, tol) {
        FaceFaceIntersection::Disjoint => PairCuts::default(),
        FaceFaceIntersection::Tangent { point } => PairCuts {
            points: vec![point],
            ..PairCuts::default()
        },
        FaceFaceIntersection::Segments(segments) => {
            trace!(a = a.index(), b = b.index(), count = segments.len(), "face pair cut");
            PairCuts {
                onto_a: segments.clone(),
                onto_b: segments,
                ..PairCuts::default()
            }
        }
        FaceFaceIntersection::Coplanar { same_normal } => PairCuts {
            onto_a: boundary_cuts(b, a, tol),
            onto_b: boundary_cuts(a, b, tol),
            coplanar: Some(same_normal),
            points: Vec::new(),
        },
    }
}

/// The boundary edges of `from` clipped to the coplanar face `onto`.
fn boundary_cuts(from: &FaceFrame, onto: &FaceFrame, tol: &Tolerance) -> Vec<Segment> {
    let mut out = Vec::new();
    for lp in from.loops() {
        let n = lp.len();
        for i in 0..n {
            let p = from.to_3d(&lp[i]);
            let q = from.to_3d(&lp[(i + 1) % n]);
            let len = (q - p).norm();
            if len <= tol.dist() {
                continue;
            }
            let dir = (q - p) / len;
            for (s, e) in spans_on(onto, &p, &dir, tol) {
                let (s, e) = (s.max(0.0), e.min(len));
                if e - s > tol.dist() {
                    out.push(Segment::new(p + dir * s, p + dir * e));
                }
            }
        }
    }
    out
}

/// Edges owned directly by a shell: wire edges and wire loop edges.
fn wire_edges(model: &Model, s: ShellId) -> Result<Vec<EdgeId>> {
    let shell = model.shell(s)?;
    let mut eus = shell.edge_uses.clone();
    for &lu in &shell.loop_uses {
        eus.extend_from_slice(model.loop_use(lu)?.edge_uses());
    }
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for eu in eus {
        let e = model.edge_use(eu)?.edge;
        if seen.insert(e) {
            edges.push(e);
        }
    }
    Ok(edges)
}

/// Points where the wire edges of `s` meet the faces and wire edges of `other`.
fn wire_points(
    model: &Model,
    s: ShellId,
    other_frames: &[FaceFrame],
    other: ShellId,
    tol: &Tolerance,
    points: &mut Vec<Point3>,
) -> Result<()> {
    let wires = wire_edges(model, s)?;
    if wires.is_empty() {
        return Ok(());
    }
    let other_wires = wire_edges(model, other)?;
    for &e in &wires {
        let (va, vb) = model.edge_vertices(e)?;
        let start = model.vertex(va)?.point;
        let Some(dir) = (model.vertex(vb)?.point - start).try_normalize(0.0) else {
            continue;
        };
        for frame in other_frames {
            match intersect_edge_face(model, e, frame.face(), tol)? {
                EdgeFaceIntersection::Disjoint => {}
                EdgeFaceIntersection::Point { point, .. } => points.push(point),
                EdgeFaceIntersection::InPlane(spans) => {
                    for (s0, s1) in spans {
                        points.push(start + dir * s0);
                        points.push(start + dir * s1);
                    }
                }
            }
        }
        for &w in &other_wires {
            match intersect_edges(model, e, w, tol)? {
                EdgeEdgeIntersection::Disjoint => {}
                EdgeEdgeIntersection::Point { point, .. } => points.push(point),
                EdgeEdgeIntersection::Overlap { start, end } => {
                    points.push(start);
                    points.push(end);
                }
            }
        }
    }
    Ok(())
}
