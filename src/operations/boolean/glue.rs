use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::math::polygon_2d::{perimeter_2d, signed_area_2d};
use crate::math::{Tolerance, Vector3};
use crate::operations::cut::Arrangement;
use crate::operations::intersect::FaceFrame;
use crate::topology::{Corner, EdgeId, FaceId, Model, ShellId, VertexId};

/// What [`glue_result`] did.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlueReport {
    /// Edges of the two operands joined into one.
    pub joined: usize,
    /// Faces produced by merging coplanar neighbours.
    pub merged: usize,
    /// Collinear vertices removed.
    pub unbroken: usize,
}

/// Moves what is left of `b` into `a` and re-establishes radial adjacency
/// among the kept faces.
///
/// With `simplify`, coplanar neighbours in `mergeable` that were cut apart
/// are merged back into one face, and vertices left between two collinear
/// edges are removed.
///
/// # Errors
///
/// Returns an error from the topology operations underneath.
pub fn glue_result(
    model: &mut Model,
    a: ShellId,
    b: ShellId,
    mergeable: &HashSet<FaceId>,
    simplify: bool,
    tol: &Tolerance,
) -> Result<GlueReport> {
    let mut report = GlueReport::default();
    model.join_shells(a, b)?;
    report.joined = model.glue_shell_edges(&[a])?;
    for e in model.shell_edges(a)? {
        model.relink_radial(e)?;
    }
    if simplify {
        report.merged = merge_coplanar_faces(model, a, mergeable, tol)?;
        report.unbroken = remove_collinear_vertices(model, a, tol)?;
    }
    debug!(
        joined = report.joined,
        merged = report.merged,
        unbroken = report.unbroken,
        "result glued"
    );
    Ok(report)
}

/// A face taking part in the coplanar merge.
struct FaceInfo {
    face: FaceId,
    normal: Vector3,
    edges: Vec<EdgeId>,
}

/// Merges every connected group of coplanar, like-facing faces of `shell`
/// drawn from `candidates`. Returns the number of faces made.
fn merge_coplanar_faces(
    model: &mut Model,
    shell: ShellId,
    candidates: &HashSet<FaceId>,
    tol: &Tolerance,
) -> Result<usize> {
    let mut infos = Vec::new();
    for f in model.shell_faces(shell)? {
        if !candidates.contains(&f) {
            continue;
        }
        let same = model.face_same_use(f)?;
        let mut edges = Vec::new();
        for &lu in &model.face_use(same)?.loop_uses {
            for &eu in model.loop_use(lu)?.edge_uses() {
                edges.push(model.edge_use(eu)?.edge);
            }
        }
        infos.push(FaceInfo {
            face: f,
            normal: model.face_normal(f)?,
            edges,
        });
    }

    let mut merged = 0;
    for component in find_connected_components(model, &infos, tol)? {
        if component.len() < 2 {
            continue;
        }
        let faces: Vec<&FaceInfo> = component.iter().map(|&i| &infos[i]).collect();
        if merge_component(model, shell, &faces, tol)? {
            merged += 1;
        }
    }
    if merged > 0 {
        model.glue_shell_edges(&[shell])?;
        for e in model.shell_edges(shell)? {
            model.relink_radial(e)?;
        }
    }
    Ok(merged)
}

/// Groups faces that meet along an edge used by no other face and lie on
/// the same plane facing the same way.
fn find_connected_components(model: &Model, infos: &[FaceInfo], tol: &Tolerance) -> Result<Vec<Vec<usize>>> {
    let mut by_edge: HashMap<EdgeId, Vec<usize>> = HashMap::new();
    for (i, info) in infos.iter().enumerate() {
        for &e in &info.edges {
            by_edge.entry(e).or_default().push(i);
        }
    }

    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); infos.len()];
    for (&e, users) in &by_edge {
        let [i, j] = users[..] else {
            continue;
        };
        if i == j || model.edge_use_count(e)? != 4 {
            continue;
        }
        let (fi, fj) = (&infos[i], &infos[j]);
        let coplanar = model
            .face(fi.face)?
            .plane
            .coincident(&model.face(fj.face)?.plane, tol);
        if coplanar && fi.normal.dot(&fj.normal) >= tol.para() {
            neighbours[i].push(j);
            neighbours[j].push(i);
        }
    }

    let mut seen = vec![false; infos.len()];
    let mut components = Vec::new();
    for start in 0..infos.len() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(i) = queue.pop_front() {
            for &j in &neighbours[i] {
                if !seen[j] {
                    seen[j] = true;
                    component.push(j);
                    queue.push_back(j);
                }
            }
        }
        components.push(component);
    }
    Ok(components)
}

/// Replaces a group of faces by the single face bounded by their outer
/// edges. Leaves the group alone, returning `false`, if the outline does not
/// resolve into exactly one region covering the same area.
fn merge_component(model: &mut Model, shell: ShellId, faces: &[&FaceInfo], tol: &Tolerance) -> Result<bool> {
    let eps = tol.dist();
    let first = faces[0].face;
    let frame = FaceFrame::new(model, first)?;
    let (plane, flip) = {
        let face = model.face(first)?;
        (Arc::clone(&face.plane), face.flip)
    };

    let mut count: HashMap<EdgeId, usize> = HashMap::new();
    for info in faces {
        for &e in &info.edges {
            *count.entry(e).or_default() += 1;
        }
    }
    for (&e, &n) in &count {
        if n > 1 && model.edge_use_count(e)? != 2 * n {
            return Ok(false);
        }
    }

    let mut arr: Arrangement<VertexId> = Arrangement::new(eps);
    let mut original = 0.0;
    for info in faces {
        original += FaceFrame::new(model, info.face)?
            .loops()
            .iter()
            .map(|l| signed_area_2d(l))
            .sum::<f64>();
        for &e in &info.edges {
            if count[&e] > 1 {
                continue;
            }
            let (va, vb) = model.edge_vertices(e)?;
            let na = arr.add_node(frame.to_2d(&model.vertex(va)?.point), Some(va));
            let nb = arr.add_node(frame.to_2d(&model.vertex(vb)?.point), Some(vb));
            arr.add_segment(na, nb);
        }
    }

    let regions = arr.regions();
    let [region] = &regions[..] else {
        return Ok(false);
    };
    let area: f64 = region.cycles().map(|c| signed_area_2d(&arr.points(c))).sum();
    let outline: f64 = region.cycles().map(|c| perimeter_2d(&arr.points(c))).sum();
    if (area - original).abs() > eps * outline.max(1.0) {
        return Ok(false);
    }
    let mut corners: Vec<Vec<Corner>> = Vec::new();
    for cycle in region.cycles() {
        let mut ring = Vec::with_capacity(cycle.len());
        for &n in cycle {
            let Some(v) = arr.tag(n) else {
                return Ok(false);
            };
            ring.push(Corner::Vertex(v));
        }
        corners.push(ring);
    }

    model.make_face(shell, plane, flip, &corners)?;
    for info in faces {
        let fu = model.face(info.face)?.face_use;
        model.kill_face_use(fu)?;
    }
    trace!(face = frame.index(), pieces = faces.len(), "coplanar faces merged");
    Ok(true)
}

/// Removes every vertex of `shell` that only joins two collinear edges.
fn remove_collinear_vertices(model: &mut Model, shell: ShellId, tol: &Tolerance) -> Result<usize> {
    let mut removed = 0;
    for v in model.shell_vertices(shell)? {
        if model.can_unbreak(v, tol) {
            model.unbreak_edge(v, tol)?;
            removed += 1;
        }
    }
    Ok(removed)
}
