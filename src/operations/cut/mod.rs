//! Cutting two shells against each other.
//!
//! After [`cut_shells`] every place where the shells meet is an edge or a
//! vertex shared by both, so every face of either shell lies entirely
//! inside, outside or on the other.

mod arrangement;
mod break_edges;
mod face_cut;
mod vertex_pool;

pub use arrangement::{Arrangement, Region};
pub use break_edges::{break_on_vertices, insert_points};
pub use face_cut::rebuild_face;
pub use vertex_pool::VertexPool;

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::math::Tolerance;
use crate::operations::intersect::intersect_shells;
use crate::topology::{FaceId, Model, ShellId};

/// What [`cut_shells`] did.
#[derive(Debug, Default)]
pub struct CutReport {
    /// Each new face, mapped to the face it was cut from.
    pub origins: HashMap<FaceId, FaceId>,
    /// Vertices of the second shell merged into the first.
    pub fused: usize,
    /// Edges split on a vertex.
    pub splits: usize,
    /// Faces replaced by their pieces.
    pub rebuilt: usize,
}

impl CutReport {
    /// The face `f` was cut from, or `f` itself.
    #[must_use]
    pub fn origin(&self, f: FaceId) -> FaceId {
        self.origins.get(&f).copied().unwrap_or(f)
    }
}

/// Cuts `a` and `b` along their mutual intersection.
///
/// Vertices of `b` within tolerance of a vertex of `a` are fused onto it and
/// coincident edges are joined. Edges are then broken on every vertex lying
/// on them, the shells are intersected, the intersection points are made
/// vertices, and each face with cuts is rebuilt from its pieces, `a` first.
/// A last pass breaks edges on the vertices the rebuild made and joins the
/// new edges.
///
/// # Errors
///
/// Returns `Degenerate` if a face cannot be rebuilt from its cuts, or an error
/// from the topology operations underneath.
#[instrument(skip(model, tol))]
pub fn cut_shells(model: &mut Model, a: ShellId, b: ShellId, tol: &Tolerance) -> Result<CutReport> {
    let mut report = CutReport::default();

    let pool_a = VertexPool::from_shells(model, &[a], tol)?;
    for v in model.shell_vertices(b)? {
        if let Some(keep) = pool_a.find(&model.vertex(v)?.point) {
            if keep != v {
                model.fuse_vertices(keep, v)?;
                report.fused += 1;
            }
        }
    }
    model.glue_shell_edges(&[a, b])?;

    let mut pool = VertexPool::from_shells(model, &[a, b], tol)?;
    report.splits += break_on_vertices(model, &[a, b], &pool, tol)?;

    let found = intersect_shells(model, a, b, tol)?;
    insert_points(model, &[a, b], &found.points, &mut pool, tol)?;

    let mut order = model.shell_faces(a)?;
    order.extend(model.shell_faces(b)?);
    for f in order {
        let Some(cuts) = found.cuts.get(&f) else {
            continue;
        };
        if let Some(pieces) = rebuild_face(model, f, cuts, &mut pool, tol)? {
            report.rebuilt += 1;
            for piece in pieces {
                report.origins.insert(piece, f);
            }
        }
    }

    report.splits += break_on_vertices(model, &[a, b], &pool, tol)?;
    model.glue_shell_edges(&[a, b])?;

    debug!(
        fused = report.fused,
        splits = report.splits,
        rebuilt = report.rebuilt,
        pieces = report.origins.len(),
        "shells cut"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::audit::check_model;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::MakeBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn two_boxes(model: &mut Model, offset: Point3) -> (ShellId, ShellId) {
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(model, r)
            .unwrap();
        let b = MakeBox::new(offset, offset + Vector3::new(1.0, 1.0, 1.0))
            .execute(model, r)
            .unwrap();
        (a, b)
    }

    #[test]
    fn offset_boxes_share_their_intersection() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        let mut model = Model::new();
        let (a, b) = two_boxes(&mut model, p(0.5, 0.0, 0.0));
        let report = cut_shells(&mut model, a, b, &Tolerance::default()).unwrap();

        // Top, bottom, front and back of both boxes are cut in two.
        assert_eq!(report.rebuilt, 8);
        assert_eq!(model.shell_faces(a).unwrap().len(), 10);
        assert_eq!(model.shell_faces(b).unwrap().len(), 10);
        assert_eq!(report.origins.len(), 16);
        assert!(check_model(&model).is_empty());

        // Every edge now carries whole faces of both shells or of neither.
        for e in model.shell_edges(a).unwrap() {
            let uses = model.edge_use_count(e).unwrap();
            assert!(uses % 2 == 0 && uses >= 4, "edge with {uses} uses");
        }
    }

    #[test]
    fn touching_boxes_fuse_their_shared_corners() {
        let mut model = Model::new();
        let (a, b) = two_boxes(&mut model, p(1.0, 0.0, 0.0));
        let report = cut_shells(&mut model, a, b, &Tolerance::default()).unwrap();
        assert_eq!(report.fused, 4);
        assert_eq!(report.rebuilt, 0);
        // The shared square's edges carry both boxes' faces.
        let shared = model
            .shell_edges(a)
            .unwrap()
            .into_iter()
            .filter(|&e| model.edge_use_count(e).unwrap() == 8)
            .count();
        assert_eq!(shared, 4);
        assert!(check_model(&model).is_empty());
    }

    #[test]
    fn distant_boxes_are_left_alone() {
        let mut model = Model::new();
        let (a, b) = two_boxes(&mut model, p(3.0, 0.0, 0.0));
        let report = cut_shells(&mut model, a, b, &Tolerance::default()).unwrap();
        assert_eq!(report.fused + report.splits + report.rebuilt, 0);
        assert_eq!(model.shell_faces(a).unwrap().len(), 6);
        assert_eq!(model.shell_faces(b).unwrap().len(), 6);
    }

    #[test]
    fn nested_corner_box_cuts_three_faces_each() {
        let mut model = Model::new();
        let (a, b) = two_boxes(&mut model, p(0.5, 0.5, 0.5));
        let report = cut_shells(&mut model, a, b, &Tolerance::default()).unwrap();
        // Three faces of each box meet the other box.
        assert_eq!(report.rebuilt, 6);
        assert!(check_model(&model).is_empty());
    }
}
