use std::collections::HashMap;

use crate::error::Result;
use crate::math::{Aabb, Point3, Tolerance};
use crate::topology::{Model, ShellId, VertexId};

type Cell = (i64, i64, i64);

/// Spatial hash of vertices, used to snap new points onto existing vertices.
///
/// Cells are twice the distance tolerance wide, so every vertex within
/// tolerance of a query point sits in one of the 27 cells around it.
#[derive(Debug, Clone)]
pub struct VertexPool {
    cell: f64,
    tol: Tolerance,
    grid: HashMap<Cell, Vec<(VertexId, Point3)>>,
    len: usize,
}

impl VertexPool {
    #[must_use]
    pub fn new(tol: &Tolerance) -> Self {
        Self {
            cell: 2.0 * tol.dist(),
            tol: *tol,
            grid: HashMap::new(),
            len: 0,
        }
    }

    /// A pool holding every vertex used by the given shells.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if a shell or a link below it is stale.
    pub fn from_shells(model: &Model, shells: &[ShellId], tol: &Tolerance) -> Result<Self> {
        let mut pool = Self::new(tol);
        for &s in shells {
            for v in model.shell_vertices(s)? {
                pool.insert(v, model.vertex(v)?.point);
            }
        }
        Ok(pool)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a vertex. A vertex already present at the same point is skipped.
    pub fn insert(&mut self, v: VertexId, point: Point3) {
        let key = self.key(&point);
        let bucket = self.grid.entry(key).or_default();
        if bucket.iter().any(|&(w, _)| w == v) {
            return;
        }
        bucket.push((v, point));
        self.len += 1;
    }

    /// The nearest vertex within tolerance of `point`.
    #[must_use]
    pub fn find(&self, point: &Point3) -> Option<VertexId> {
        let (cx, cy, cz) = self.key(point);
        let mut best: Option<(f64, VertexId)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &(v, q) in bucket {
                        let d = (q - point).norm_squared();
                        if d <= self.tol.dist_sq() && best.is_none_or(|(b, _)| d < b) {
                            best = Some((d, v));
                        }
                    }
                }
            }
        }
        best.map(|(_, v)| v)
    }

    /// Every vertex whose point lies in `bbox`.
    ///
    /// Walks the cells the box covers, or the occupied cells when those are
    /// fewer.
    #[must_use]
    pub fn within(&self, bbox: &Aabb) -> Vec<(VertexId, Point3)> {
        if bbox.is_empty() {
            return Vec::new();
        }
        let lo = self.key(&bbox.min);
        let hi = self.key(&bbox.max);
        let span = |a: i64, b: i64| u128::try_from(i128::from(b) - i128::from(a) + 1).unwrap_or(0);
        let covered = span(lo.0, hi.0)
            .saturating_mul(span(lo.1, hi.1))
            .saturating_mul(span(lo.2, hi.2));
        let inside = |&&(_, p): &&(VertexId, Point3)| bbox.contains_point(&p, 0.0);

        if covered <= u128::try_from(self.grid.len()).unwrap_or(u128::MAX) {
            let mut out = Vec::new();
            for x in lo.0..=hi.0 {
                for y in lo.1..=hi.1 {
                    for z in lo.2..=hi.2 {
                        if let Some(bucket) = self.grid.get(&(x, y, z)) {
                            out.extend(bucket.iter().filter(inside).copied());
                        }
                    }
                }
            }
            out
        } else {
            let covers = |&(x, y, z): &Cell| {
                (lo.0..=hi.0).contains(&x) && (lo.1..=hi.1).contains(&y) && (lo.2..=hi.2).contains(&z)
            };
            self.grid
                .iter()
                .filter(|(key, _)| covers(*key))
                .flat_map(|(_, bucket)| bucket.iter().filter(inside).copied())
                .collect()
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, p: &Point3) -> Cell {
        let f = |x: f64| (x / self.cell).floor() as i64;
        (f(p.x), f(p.y), f(p.z))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn finds_box_corners_within_tolerance() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let tol = Tolerance::default();
        let pool = VertexPool::from_shells(&model, &[s], &tol).unwrap();
        assert_eq!(pool.len(), 8);

        let v = pool.find(&p(1.0, 1.0, 1.0 + 0.5 * tol.dist())).unwrap();
        assert_eq!(model.vertex(v).unwrap().point, p(1.0, 1.0, 1.0));
        assert!(pool.find(&p(0.5, 0.5, 0.5)).is_none());
        assert!(pool.find(&p(1.0, 1.0, 1.0 + 2.0 * tol.dist())).is_none());
    }

    #[test]
    fn straddling_a_cell_boundary_still_finds_the_vertex() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = model.make_shell(r).unwrap();
        let tol = Tolerance::default();
        // Sits just below a cell boundary; the query sits just above it.
        let at = p(2.0 * tol.dist() - 1e-12, 0.0, 0.0);
        let vu = model.make_shell_vertex(s, at.into()).unwrap();
        let v = model.vertex_use(vu).unwrap().vertex;

        let mut pool = VertexPool::new(&tol);
        pool.insert(v, at);
        pool.insert(v, at);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.find(&p(2.0 * tol.dist() + 1e-12, 0.0, 0.0)), Some(v));
    }

    #[test]
    fn within_filters_by_box() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let pool = VertexPool::from_shells(&model, &[s], &Tolerance::default()).unwrap();
        let floor = Aabb::from_points([p(-0.1, -0.1, -0.1), p(1.1, 1.1, 0.1)].iter());
        assert_eq!(pool.within(&floor).len(), 4);
    }

    #[test]
    fn within_matches_a_full_scan() {
        let mut keys = slotmap::SlotMap::<VertexId, ()>::with_key();
        // Cells 0.2 wide.
        let tol = Tolerance::new(0.1).unwrap();
        let mut pool = VertexPool::new(&tol);
        let mut all = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                let at = p(f64::from(i) * 0.25, f64::from(j) * 0.25, f64::from(i + j) * 1e-7);
                let v = keys.insert(());
                pool.insert(v, at);
                all.push((v, at));
            }
        }

        // A box a few cells wide walks its cells; a huge one walks the grid.
        let small = Aabb::from_points([p(0.2, 0.2, -1e-6), p(0.55, 0.8, 1e-5)].iter());
        let huge = Aabb::from_points([p(-1e6, -1e6, -1e6), p(1e6, 1e6, 1e6)].iter());
        for bbox in [small, huge] {
            let mut got: Vec<_> = pool.within(&bbox).into_iter().map(|(v, _)| v).collect();
            let mut want: Vec<_> = all
                .iter()
                .filter(|(_, q)| bbox.contains_point(q, 0.0))
                .map(|&(v, _)| v)
                .collect();
            got.sort();
            want.sort();
            assert_eq!(got, want);
        }
        assert_eq!(pool.within(&small).len(), 6);
        assert!(pool.within(&Aabb::empty()).is_empty());
    }
}
