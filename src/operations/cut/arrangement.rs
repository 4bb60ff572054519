//! Planar arrangement of 2D segments, resolved into the bounded regions
//! they enclose.

use std::collections::{BTreeSet, HashMap};

use crate::math::intersect_2d::{point_segment_distance_2d, segment_segment_intersect_2d};
use crate::math::polygon_2d::{signed_area_2d, winding_number_2d};
use crate::math::Point2;

/// A bounded region: a counter-clockwise outer cycle and clockwise holes,
/// as node indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub outer: Vec<usize>,
    pub holes: Vec<Vec<usize>>,
}

impl Region {
    /// Every cycle, outer first.
    pub fn cycles(&self) -> impl Iterator<Item = &Vec<usize>> {
        std::iter::once(&self.outer).chain(&self.holes)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.cycles().map(Vec::len).sum()
    }
}

/// Nodes and segments in a plane. Each node may carry a tag; nodes closer
/// than `eps` are one node.
#[derive(Debug, Clone)]
pub struct Arrangement<T> {
    eps: f64,
    nodes: Vec<(Point2, Option<T>)>,
    segments: Vec<(usize, usize)>,
}

impl<T: Copy> Arrangement<T> {
    #[must_use]
    pub fn new(eps: f64) -> Self {
        Self {
            eps,
            nodes: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Adds a node, or returns the existing node within `eps`. An untagged
    /// node picks up the tag of a later duplicate.
    pub fn add_node(&mut self, p: Point2, tag: Option<T>) -> usize {
        if let Some(i) = self.nodes.iter().position(|(q, _)| (q - p).norm() <= self.eps) {
            if self.nodes[i].1.is_none() {
                self.nodes[i].1 = tag;
            }
            return i;
        }
        self.nodes.push((p, tag));
        self.nodes.len() - 1
    }

    pub fn add_segment(&mut self, a: usize, b: usize) {
        if a != b {
            self.segments.push((a, b));
        }
    }

    #[must_use]
    pub fn point(&self, node: usize) -> Point2 {
        self.nodes[node].0
    }

    #[must_use]
    pub fn tag(&self, node: usize) -> Option<T> {
        self.nodes[node].1
    }

    pub fn set_tag(&mut self, node: usize, tag: T) {
        self.nodes[node].1 = Some(tag);
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The 2D points of a cycle.
    #[must_use]
    pub fn points(&self, cycle: &[usize]) -> Vec<Point2> {
        cycle.iter().map(|&n| self.nodes[n].0).collect()
    }

    /// Resolves crossings and returns the bounded regions.
    ///
    /// Segments are split at every crossing and at every node lying on them.
    /// Dangling segments are dropped. Each remaining face of the planar graph
    /// becomes a region; a component nested inside a face becomes one of its
    /// holes, and components not inside any face are ignored.
    pub fn regions(&mut self) -> Vec<Region> {
        self.add_crossings();
        let edges = self.split_edges();
        let edges = prune_dangling(edges);
        let cycles = self.trace_cycles(&edges);

        let mut outers: Vec<(f64, Vec<usize>)> = Vec::new();
        let mut holes: Vec<Vec<usize>> = Vec::new();
        let min_area = self.eps * self.eps;
        for cycle in cycles {
            let area = signed_area_2d(&self.points(&cycle));
            if area > min_area {
                outers.push((area, cycle));
            } else if area < -min_area {
                holes.push(cycle);
            }
        }

        let mut regions: Vec<Region> = outers
            .iter()
            .map(|(_, c)| Region {
                outer: c.clone(),
                holes: Vec::new(),
            })
            .collect();
        for hole in holes {
            if let Some(i) = self.smallest_container(&outers, &hole) {
                regions[i].holes.push(hole);
            }
        }
        regions
    }

    fn add_crossings(&mut self) {
        let mut crossings = Vec::new();
        for (i, &(a, b)) in self.segments.iter().enumerate() {
            for &(c, d) in &self.segments[i + 1..] {
                if a == c || a == d || b == c || b == d {
                    continue;
                }
                let [pa, pb, pc, pd] = [a, b, c, d].map(|n| self.nodes[n].0);
                let Some((x, _, _)) = segment_segment_intersect_2d(&pa, &pb, &pc, &pd, self.eps) else {
                    continue;
                };
                if [pa, pb, pc, pd].iter().all(|q| (q - x).norm() > self.eps) {
                    crossings.push(x);
                }
            }
        }
        for x in crossings {
            self.add_node(x, None);
        }
    }

    /// Undirected edges after splitting every segment at the nodes on it.
    fn split_edges(&self) -> BTreeSet<(usize, usize)> {
        let mut edges = BTreeSet::new();
        for &(a, b) in &self.segments {
            let (pa, pb) = (self.nodes[a].0, self.nodes[b].0);
            let mut on: Vec<(f64, usize)> = self
                .nodes
                .iter()
                .enumerate()
                .filter(|&(n, _)| n != a && n != b)
                .filter_map(|(n, (q, _))| {
                    let (d, t) = point_segment_distance_2d(q, &pa, &pb);
                    (d <= self.eps && t > 0.0 && t < 1.0).then_some((t, n))
                })
                .collect();
            on.sort_by(|x, y| x.0.total_cmp(&y.0));
            let chain = std::iter::once(a).chain(on.into_iter().map(|(_, n)| n)).chain(std::iter::once(b));
            let mut prev = None;
            for n in chain {
                if let Some(m) = prev {
                    if m != n {
                        edges.insert((n.min(m), n.max(m)));
                    }
                }
                prev = Some(n);
            }
        }
        edges
    }

    /// Traces the faces of the graph. Bounded faces come out counter-clockwise,
    /// the outside of each component clockwise.
    fn trace_cycles(&self, edges: &BTreeSet<(usize, usize)>) -> Vec<Vec<usize>> {
        let mut out: HashMap<usize, Vec<usize>> = HashMap::new();
        for &(a, b) in edges {
            out.entry(a).or_default().push(b);
            out.entry(b).or_default().push(a);
        }
        for (&v, targets) in &mut out {
            let origin = self.nodes[v].0;
            targets.sort_by(|&x, &y| {
                let dx = self.nodes[x].0 - origin;
                let dy = self.nodes[y].0 - origin;
                dx.y.atan2(dx.x).total_cmp(&dy.y.atan2(dy.x))
            });
        }

        let mut used: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut cycles = Vec::new();
        let mut starts: Vec<(usize, usize)> = edges.iter().flat_map(|&(a, b)| [(a, b), (b, a)]).collect();
        starts.sort_unstable();
        for start in starts {
            if used.contains(&start) {
                continue;
            }
            let mut cycle = Vec::new();
            let mut h = start;
            while used.insert(h) {
                cycle.push(h.0);
                let (u, v) = h;
                let around = &out[&v];
                let k = around.iter().position(|&w| w == u).unwrap_or(0);
                h = (v, around[(k + around.len() - 1) % around.len()]);
            }
            cycles.extend(split_pinched(cycle));
        }
        cycles
    }

    fn smallest_container(&self, outers: &[(f64, Vec<usize>)], hole: &[usize]) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (i, (area, outer)) in outers.iter().enumerate() {
            let polygon = self.points(outer);
            let inside = hole.iter().any(|&n| {
                let p = self.nodes[n].0;
                let on_boundary = (0..polygon.len())
                    .any(|j| point_segment_distance_2d(&p, &polygon[j], &polygon[(j + 1) % polygon.len()]).0 <= self.eps);
                !on_boundary && winding_number_2d(&p, &polygon) != 0
            });
            if inside && best.is_none_or(|(a, _)| *area < a) {
                best = Some((*area, i));
            }
        }
        best.map(|(_, i)| i)
    }
}

/// Drops edges with an end of degree one, repeatedly.
fn prune_dangling(mut edges: BTreeSet<(usize, usize)>) -> BTreeSet<(usize, usize)> {
    loop {
        let mut degree: HashMap<usize, usize> = HashMap::new();
        for &(a, b) in &edges {
            *degree.entry(a).or_default() += 1;
            *degree.entry(b).or_default() += 1;
        }
        let before = edges.len();
        edges.retain(|(a, b)| degree[a] > 1 && degree[b] > 1);
        if edges.len() == before {
            return edges;
        }
    }
}

/// Splits a traced cycle that passes through a node more than once into
/// simple cycles, dropping the back-and-forth walks along bridges.
fn split_pinched(cycle: Vec<usize>) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut stack: Vec<usize> = Vec::with_capacity(cycle.len());
    for n in cycle {
        if let Some(pos) = stack.iter().position(|&m| m == n) {
            let sub = stack.split_off(pos + 1);
            let mut looped = vec![n];
            looped.extend(sub);
            if looped.len() >= 3 {
                out.push(looped);
            }
        } else {
            stack.push(n);
        }
    }
    if stack.len() >= 3 {
        out.push(stack);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn polygon(arr: &mut Arrangement<u32>, points: &[Point2]) -> Vec<usize> {
        let nodes: Vec<usize> = points.iter().map(|&q| arr.add_node(q, None)).collect();
        for i in 0..nodes.len() {
            arr.add_segment(nodes[i], nodes[(i + 1) % nodes.len()]);
        }
        nodes
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2> {
        vec![p(x0, y0), p(x0 + size, y0), p(x0 + size, y0 + size), p(x0, y0 + size)]
    }

    fn area(arr: &Arrangement<u32>, region: &Region) -> f64 {
        region.cycles().map(|c| signed_area_2d(&arr.points(c))).sum()
    }

    // ── Single regions ──

    #[test]
    fn square_is_one_region() {
        let mut arr = Arrangement::new(1e-9);
        polygon(&mut arr, &square(0.0, 0.0, 1.0));
        let regions = arr.regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].outer.len(), 4);
        assert!(regions[0].holes.is_empty());
        assert!((area(&arr, &regions[0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clockwise_input_still_gives_a_ccw_region() {
        let mut arr = Arrangement::new(1e-9);
        let mut pts = square(0.0, 0.0, 1.0);
        pts.reverse();
        polygon(&mut arr, &pts);
        let regions = arr.regions();
        assert_eq!(regions.len(), 1);
        assert!(signed_area_2d(&arr.points(&regions[0].outer)) > 0.0);
    }

    #[test]
    fn dangling_cut_is_pruned() {
        let mut arr = Arrangement::new(1e-9);
        polygon(&mut arr, &square(0.0, 0.0, 2.0));
        let a = arr.add_node(p(1.0, 0.0), None);
        let b = arr.add_node(p(1.0, 1.0), None);
        arr.add_segment(a, b);
        let regions = arr.regions();
        assert_eq!(regions.len(), 1);
        // The foot of the cut stays on the boundary as an extra node.
        assert_eq!(regions[0].outer.len(), 5);
    }

    // ── Splitting ──

    #[test]
    fn chord_splits_square_in_two() {
        let mut arr = Arrangement::new(1e-9);
        polygon(&mut arr, &square(0.0, 0.0, 2.0));
        let a = arr.add_node(p(1.0, 0.0), None);
        let b = arr.add_node(p(1.0, 2.0), None);
        arr.add_segment(a, b);
        let regions = arr.regions();
        assert_eq!(regions.len(), 2);
        for r in &regions {
            assert!((area(&arr, r) - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn crossing_chords_make_four_regions() {
        let mut arr = Arrangement::new(1e-9);
        polygon(&mut arr, &square(0.0, 0.0, 2.0));
        let a = arr.add_node(p(1.0, 0.0), None);
        let b = arr.add_node(p(1.0, 2.0), None);
        let c = arr.add_node(p(0.0, 1.0), None);
        let d = arr.add_node(p(2.0, 1.0), None);
        arr.add_segment(a, b);
        arr.add_segment(c, d);
        let regions = arr.regions();
        assert_eq!(regions.len(), 4);
        assert!(regions.iter().all(|r| (area(&arr, r) - 1.0).abs() < 1e-12));
        assert_eq!(arr.node_count(), 9);
    }

    #[test]
    fn overlapping_collinear_segments_merge() {
        let mut arr = Arrangement::new(1e-9);
        polygon(&mut arr, &square(0.0, 0.0, 2.0));
        // Runs along the bottom edge and on up through the middle.
        let a = arr.add_node(p(1.0, 0.0), None);
        let b = arr.add_node(p(2.0, 0.0), None);
        let c = arr.add_node(p(1.0, 2.0), None);
        arr.add_segment(a, b);
        arr.add_segment(a, c);
        assert_eq!(arr.regions().len(), 2);
    }

    // ── Holes ──

    #[test]
    fn nested_square_becomes_a_hole_and_an_island() {
        let mut arr = Arrangement::new(1e-9);
        polygon(&mut arr, &square(0.0, 0.0, 3.0));
        polygon(&mut arr, &square(1.0, 1.0, 1.0));
        let mut regions = arr.regions();
        regions.sort_by(|a, b| a.holes.len().cmp(&b.holes.len()));
        assert_eq!(regions.len(), 2);
        assert!(regions[0].holes.is_empty());
        assert!((area(&arr, &regions[0]) - 1.0).abs() < 1e-12);
        assert_eq!(regions[1].holes.len(), 1);
        assert!((area(&arr, &regions[1]) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn squares_sharing_a_corner_stay_separate() {
        let mut arr = Arrangement::new(1e-9);
        polygon(&mut arr, &square(0.0, 0.0, 1.0));
        polygon(&mut arr, &square(1.0, 1.0, 1.0));
        let regions = arr.regions();
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| r.outer.len() == 4 && r.holes.is_empty()));
    }

    #[test]
    fn tags_survive_merging() {
        let mut arr: Arrangement<u32> = Arrangement::new(1e-6);
        let a = arr.add_node(p(0.0, 0.0), None);
        let b = arr.add_node(p(0.0, 1e-7), Some(7));
        assert_eq!(a, b);
        assert_eq!(arr.tag(a), Some(7));
        arr.add_node(p(0.0, 0.0), Some(9));
        assert_eq!(arr.tag(a), Some(7));
    }
}
