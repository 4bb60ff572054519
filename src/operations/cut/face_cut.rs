use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{GeometryError, Result, TopologyError};
use crate::math::intersect_2d::point_segment_distance_2d;
use crate::math::polygon_2d::{interior_point, perimeter_2d, signed_area_2d, Containment};
use crate::math::{Point2, Point3, Tolerance};
use crate::operations::intersect::{FaceFrame, Segment};
use crate::topology::{Corner, FaceId, Model, VertexId};

use super::arrangement::{Arrangement, Region};
use super::vertex_pool::VertexPool;

fn corner(arr: &Arrangement<VertexId>, node: usize, frame: &FaceFrame, pool: &VertexPool) -> Corner {
    if let Some(v) = arr.tag(node) {
        return Corner::Vertex(v);
    }
    let p = frame.to_3d(&arr.point(node));
    pool.find(&p).map_or(Corner::Point(p), Corner::Vertex)
}

/// Places a cut end in the face's plane.
///
/// An end within tolerance of a pooled vertex takes that vertex and its exact
/// position. An end within tolerance of the boundary but not on it is moved
/// onto the nearest boundary segment, so it splits that segment instead of
/// hanging just outside it.
fn place_cut_end(
    model: &Model,
    frame: &FaceFrame,
    end: &Point3,
    pool: &VertexPool,
    eps: f64,
) -> Result<(Point2, Option<VertexId>)> {
    if let Some(v) = pool.find(end) {
        return Ok((frame.to_2d(&model.vertex(v)?.point), Some(v)));
    }
    let q = frame.to_2d(end);
    if frame.contains_2d(&q, eps) != Containment::On {
        return Ok((q, None));
    }
    let mut nearest: Option<(f64, Point2)> = None;
    for lp in frame.loops() {
        for (i, a) in lp.iter().enumerate() {
            let b = &lp[(i + 1) % lp.len()];
            let (d, t) = point_segment_distance_2d(&q, a, b);
            if nearest.is_none_or(|(best, _)| d < best) {
                nearest = Some((d, a + (b - a) * t));
            }
        }
    }
    match nearest {
        Some((d, on)) if d > 0.0 => {
            warn!(face = frame.index(), offset = d, "cut end nudged onto the boundary");
            Ok((on, None))
        }
        _ => Ok((q, None)),
    }
}

/// Replaces face `f` by the pieces its cut segments divide it into.
///
/// The face's loops and the cuts are laid out in the face's plane and
/// resolved into regions. Each region inside the face becomes a new face on
/// the same plane, reusing the face's vertices and any pooled vertex under a
/// cut end; vertices made for new points are pooled. The old face is removed.
///
/// Returns the new faces, or `None` if the cuts leave the face unchanged.
///
/// # Errors
///
/// Returns `Degenerate` if the pieces do not cover the face, which happens
/// when the cuts and the boundary cross inconsistently.
pub fn rebuild_face(
    model: &mut Model,
    f: FaceId,
    cuts: &[Segment],
    pool: &mut VertexPool,
    tol: &Tolerance,
) -> Result<Option<Vec<FaceId>>> {
    let eps = tol.dist();
    let frame = FaceFrame::new(model, f)?;
    let (plane, flip) = {
        let face = model.face(f)?;
        (Arc::clone(&face.plane), face.flip)
    };
    let same = model.face_same_use(f)?;
    let shell = model.face_use(same)?.shell;
    let loop_uses = model.face_use(same)?.loop_uses.clone();

    let mut arr: Arrangement<VertexId> = Arrangement::new(eps);
    let mut boundary = 0;
    for &lu in &loop_uses {
        let nodes = model
            .loop_vertices(lu)?
            .into_iter()
            .map(|v| Ok(arr.add_node(frame.to_2d(&model.vertex(v)?.point), Some(v))))
            .collect::<Result<Vec<_>, TopologyError>>()?;
        boundary += nodes.len();
        for i in 0..nodes.len() {
            arr.add_segment(nodes[i], nodes[(i + 1) % nodes.len()]);
        }
    }
    for cut in cuts {
        let (pa, va) = place_cut_end(model, &frame, &cut.start, pool, eps)?;
        let (pb, vb) = place_cut_end(model, &frame, &cut.end, pool, eps)?;
        let a = arr.add_node(pa, va);
        let b = arr.add_node(pb, vb);
        arr.add_segment(a, b);
    }

    let regions = arr.regions();
    if let [only] = &regions[..] {
        if only.node_count() == boundary && only.holes.len() + 1 == loop_uses.len() {
            return Ok(None);
        }
    }

    let kept: Vec<Region> = regions
        .into_iter()
        .filter(|r| {
            let loops: Vec<Vec<Point2>> = r.cycles().map(|c| arr.points(c)).collect();
            interior_point(&loops, eps).is_some_and(|ip| frame.contains_2d(&ip, eps) == Containment::Inside)
        })
        .collect();

    let original: f64 = frame.loops().iter().map(|l| signed_area_2d(l)).sum();
    let rebuilt: f64 = kept
        .iter()
        .flat_map(Region::cycles)
        .map(|c| signed_area_2d(&arr.points(c)))
        .sum();
    let slack = eps * frame.loops().iter().map(|l| perimeter_2d(l)).sum::<f64>().max(1.0);
    if kept.is_empty() || (original - rebuilt).abs() > slack {
        return Err(GeometryError::degenerate_at("cut face boundary self-intersects", frame.index()).into());
    }

    let mut faces = Vec::with_capacity(kept.len());
    for region in &kept {
        let corners: Vec<Vec<Corner>> = region
            .cycles()
            .map(|c| c.iter().map(|&n| corner(&arr, n, &frame, pool)).collect())
            .collect();
        let fu = model.make_face(shell, Arc::clone(&plane), flip, &corners)?;
        let new_loops = model.face_use(fu)?.loop_uses.clone();
        for (cycle, lu) in region.cycles().zip(new_loops) {
            for (&n, v) in cycle.iter().zip(model.loop_vertices(lu)?) {
                if arr.tag(n).is_none() {
                    arr.set_tag(n, v);
                    pool.insert(v, model.vertex(v)?.point);
                }
            }
        }
        faces.push(model.face_use(fu)?.face);
    }
    model.kill_face_use(same)?;
    trace!(face = frame.index(), pieces = faces.len(), cuts = cuts.len(), "face rebuilt");
    Ok(Some(faces))
}
