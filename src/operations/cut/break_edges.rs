use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::math::{Aabb, Point3, Tolerance};
use crate::topology::{Corner, EdgeId, Model, ShellId, VertexId};

use super::vertex_pool::VertexPool;

/// Distance of `p` from `a` along `a..b`, when `p` lies within tolerance of
/// the segment and clear of both ends.
fn interior_param(a: &Point3, b: &Point3, p: &Point3, tol: &Tolerance) -> Option<f64> {
    let d = b - a;
    let len = d.norm();
    if len <= 2.0 * tol.dist() {
        return None;
    }
    let dir = d / len;
    let t = (p - a).dot(&dir);
    if t <= tol.dist() || t >= len - tol.dist() {
        return None;
    }
    ((p - (a + dir * t)).norm() <= tol.dist()).then_some(t)
}

fn distinct_edges(model: &Model, shells: &[ShellId]) -> Result<Vec<EdgeId>> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for &s in shells {
        for e in model.shell_edges(s)? {
            if seen.insert(e) {
                edges.push(e);
            }
        }
    }
    Ok(edges)
}

/// Splits every edge of `shells` whose interior passes within tolerance of a
/// pooled vertex. Returns the number of splits.
///
/// # Errors
///
/// Returns an error if a handle is stale or a split fails.
pub fn break_on_vertices(model: &mut Model, shells: &[ShellId], pool: &VertexPool, tol: &Tolerance) -> Result<usize> {
    let mut splits = 0;
    for e in distinct_edges(model, shells)? {
        let (va, vb) = model.edge_vertices(e)?;
        let a = model.vertex(va)?.point;
        let b = model.vertex(vb)?.point;
        let bbox = Aabb::from_points([a, b].iter()).expanded(tol.dist());

        let mut hits: Vec<(f64, VertexId)> = pool
            .within(&bbox)
            .into_iter()
            .filter(|&(v, _)| v != va && v != vb)
            .filter_map(|(v, p)| interior_param(&a, &b, &p, tol).map(|t| (t, v)))
            .collect();
        hits.sort_by(|x, y| x.0.total_cmp(&y.0));
        hits.dedup_by(|x, y| x.0 - y.0 <= tol.dist());

        // `split_edge` keeps the first half on `e`, so walk the rest forward.
        let mut rest = e;
        for (_, v) in hits {
            rest = model.split_edge(rest, Corner::Vertex(v))?.1;
            splits += 1;
        }
    }
    if splits > 0 {
        debug!(splits, "edges broken on vertices");
    }
    Ok(splits)
}

/// Makes every point a vertex on the edges it lies on.
///
/// A point within tolerance of a pooled vertex reuses it. Otherwise the first
/// edge found under the point is split there and the new vertex is pooled;
/// any further edge under the point is split on that same vertex. Points away
/// from every edge are left alone. Returns the number of new vertices.
///
/// # Errors
///
/// Returns an error if a handle is stale or a split fails.
pub fn insert_points(
    model: &mut Model,
    shells: &[ShellId],
    points: &[Point3],
    pool: &mut VertexPool,
    tol: &Tolerance,
) -> Result<usize> {
    let mut edges = distinct_edges(model, shells)?;
    let mut made = 0;
    for p in points {
        let mut at = pool.find(p);
        let mut i = 0;
        while i < edges.len() {
            let e = edges[i];
            i += 1;
            let (va, vb) = model.edge_vertices(e)?;
            if at == Some(va) || at == Some(vb) {
                continue;
            }
            let (a, b) = (model.vertex(va)?.point, model.vertex(vb)?.point);
            if interior_param(&a, &b, p, tol).is_none() {
                continue;
            }
            let corner = at.map_or(Corner::Point(*p), Corner::Vertex);
            let (v, second) = model.split_edge(e, corner)?;
            if at.is_none() {
                pool.insert(v, *p);
                made += 1;
            }
            at = Some(v);
            edges.push(second);
        }
    }
    Ok(made)
}
