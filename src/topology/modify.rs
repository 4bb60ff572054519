use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{GeometryError, Result, TopologyError};
use crate::geometry::Line;
use crate::math::{Aabb, Tolerance};

use super::{
    Corner, EdgeId, EdgeUseId, EdgeUseParent, FaceId, FaceUseId, LoopDown, LoopParent,
    LoopUseId, Model, ShellId, VertexId, VertexUseParent,
};

/// What `unbreak_edge` will do at a vertex, worked out before any mutation.
struct Unbreak {
    keep: EdgeId,
    gone: EdgeId,
    /// Uses that end at the vertex; each one absorbs the use after it.
    survivors: Vec<EdgeUseId>,
    followers: Vec<EdgeUseId>,
    mates: Vec<(EdgeUseId, EdgeUseId)>,
}

impl Model {
    /// Splits an edge at a point, in every face and wire that uses it.
    ///
    /// Each use `u` is followed in its loop (or shell) by a new use starting
    /// at the split vertex. The half touching the reference start vertex keeps
    /// the original edge; the other half becomes a new edge sharing the same
    /// line geometry. Returns the split vertex and the new edge.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` if the split point is one of the edge's vertices,
    /// or an error if the radial cycle is broken.
    pub fn split_edge(&mut self, e: EdgeId, at: Corner) -> Result<(VertexId, EdgeId)> {
        let (va, vb) = self.edge_vertices(e)?;
        let uses = self.edge_uses_of(e)?;
        match at {
            Corner::Vertex(v) if v == va || v == vb => {
                return Err(GeometryError::degenerate_at("split at an end of the edge", self.edge(e)?.index).into());
            }
            Corner::Point(p) if p == self.vertex(va)?.point || p == self.vertex(vb)?.point => {
                return Err(GeometryError::degenerate_at("split at an end of the edge", self.edge(e)?.index).into());
            }
            _ => {}
        }
        let v = match at {
            Corner::Vertex(v) => {
                self.vertex(v)?;
                v
            }
            Corner::Point(point) => {
                let index = self.alloc_index();
                self.vertices.insert(super::VertexData {
                    index,
                    point,
                    uses: Vec::new(),
                })
            }
        };

        let line = Arc::clone(&self.edge(e)?.line);
        let reference = self.edge(e)?.edge_use;
        let index = self.alloc_index();
        let e2 = self.edges.insert(super::EdgeData {
            index,
            edge_use: reference,
            line,
        });

        let mut next: HashMap<EdgeUseId, EdgeUseId> = HashMap::with_capacity(uses.len());
        for &u in &uses {
            let parent = self.edge_use(u)?.parent;
            let n = self.new_edge_use(parent, e2);
            let vu = self.new_vertex_use(v, VertexUseParent::EdgeUse(n))?;
            self.edge_use_mut(n)?.vertex_use = vu;
            next.insert(u, n);
        }

        let mut links = Vec::with_capacity(uses.len());
        for &u in &uses {
            let data = self.edge_use(u)?;
            links.push((u, data.mate, data.radial, self.eu_start(u)? == va));
        }
        let piece = |u: EdgeUseId| next.get(&u).copied().unwrap_or(u);
        let mut affected_loops = Vec::new();
        for &(u, mate, radial, from_start) in &links {
            let n = piece(u);
            {
                let data = self.edge_use_mut(u)?;
                data.mate = piece(mate);
                data.radial = piece(radial);
                data.edge = if from_start { e } else { e2 };
            }
            {
                let data = self.edge_use_mut(n)?;
                data.mate = mate;
                data.radial = radial;
                data.edge = if from_start { e2 } else { e };
            }
            match self.edge_use(u)?.parent {
                EdgeUseParent::LoopUse(lu) => {
                    let LoopDown::Edges(list) = &mut self.loop_use_mut(lu)?.down else {
                        return Err(TopologyError::InvalidTopology("edge-use in a vertex loop".into()).into());
                    };
                    let pos = list.iter().position(|&x| x == u).map_or(list.len(), |p| p + 1);
                    list.insert(pos, n);
                    affected_loops.push(lu);
                }
                EdgeUseParent::Shell(s) => self.shell_mut(s)?.edge_uses.push(n),
            }
        }

        let (e_ref, e2_ref) = if self.eu_start(reference)? == va {
            (reference, piece(reference))
        } else {
            (piece(reference), reference)
        };
        self.edge_mut(e)?.edge_use = e_ref;
        self.edge_mut(e2)?.edge_use = e2_ref;
        for lu in affected_loops {
            self.refresh_loop_bbox(lu)?;
        }
        Ok((v, e2))
    }

    /// Returns `true` if [`Model::unbreak_edge`] would succeed at `v`.
    #[must_use]
    pub fn can_unbreak(&self, v: VertexId, tol: &Tolerance) -> bool {
        self.plan_unbreak(v, tol).is_ok()
    }

    /// Removes a vertex between two collinear edges, joining them into one.
    ///
    /// The vertex must be used only by the two edges, every face that uses
    /// one edge must pass straight through the vertex onto the other, and the
    /// two far ends must be distinct vertices. Returns the surviving edge.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTopology` when the vertex cannot be removed.
    pub fn unbreak_edge(&mut self, v: VertexId, tol: &Tolerance) -> Result<EdgeId> {
        let plan = self.plan_unbreak(v, tol)?;
        for &f in &plan.followers {
            let data = self.edge_use(f)?;
            let (vu, parent) = (data.vertex_use, data.parent);
            if let EdgeUseParent::LoopUse(lu) = parent {
                if let LoopDown::Edges(list) = &mut self.loop_use_mut(lu)?.down {
                    list.retain(|&x| x != f);
                }
            }
            self.remove_vertex_use(vu)?;
            self.edge_uses.remove(f);
        }
        for &(s, m) in &plan.mates {
            self.edge_use_mut(s)?.mate = m;
        }
        self.relink_radial_uses(plan.keep, &plan.survivors)?;
        self.edges.remove(plan.gone);
        Ok(plan.keep)
    }

    fn plan_unbreak(&self, v: VertexId, tol: &Tolerance) -> Result<Unbreak> {
        let refuse = |reason: &str| -> Result<Unbreak> {
            Err(TopologyError::InvalidTopology(format!("cannot unbreak at vertex: {reason}")).into())
        };
        for &vu in &self.vertex(v)?.uses {
            if !matches!(self.vertex_use(vu)?.parent, VertexUseParent::EdgeUse(_)) {
                return refuse("it is used outside of edges");
            }
        }
        let edges = self.vertex_edges(v)?;
        let [keep, gone] = edges[..] else {
            return refuse("it is not shared by exactly two edges");
        };
        let far_end = |e: EdgeId| -> Result<VertexId> {
            let (a, b) = self.edge_vertices(e)?;
            Ok(if a == v { b } else { a })
        };
        let (a, b) = (far_end(keep)?, far_end(gone)?);
        if a == b || a == v || b == v {
            return refuse("the far ends coincide");
        }
        let pa = self.vertex(a)?.point;
        let pb = self.vertex(b)?.point;
        let pv = self.vertex(v)?.point;
        let Ok(line) = Line::through(&pa, &pb) else {
            return refuse("the far ends coincide");
        };
        let t = line.parameter_of(&pv);
        if line.distance_to(&pv) > tol.dist() || t <= 0.0 || t >= (pb - pa).norm() {
            return refuse("the edges are not collinear");
        }

        let keep_uses = self.edge_uses_of(keep)?;
        let gone_uses = self.edge_uses_of(gone)?;
        if keep_uses.len() != gone_uses.len() {
            return refuse("the edges have different use counts");
        }
        let gone_set: HashSet<EdgeUseId> = gone_uses.iter().copied().collect();
        let mut survivors = Vec::with_capacity(keep_uses.len());
        let mut followers = Vec::with_capacity(keep_uses.len());
        for &u in keep_uses.iter().chain(&gone_uses) {
            if self.eu_end(u)? != v {
                continue;
            }
            let Some((_, next)) = self.loop_neighbours(u)? else {
                return refuse("a wire edge ends there");
            };
            if gone_set.contains(&u) == gone_set.contains(&next) {
                return refuse("a loop turns back at the vertex");
            }
            survivors.push(u);
            followers.push(next);
        }
        let mut mates = Vec::with_capacity(survivors.len());
        for &s in &survivors {
            let old = self.edge_use(s)?.mate;
            let Some((prev, _)) = self.loop_neighbours(old)? else {
                return refuse("a wire edge ends there");
            };
            mates.push((s, prev));
        }
        Ok(Unbreak {
            keep,
            gone,
            survivors,
            followers,
            mates,
        })
    }

    /// Previous and next edge-use in the loop of `eu`, or `None` for a wire edge.
    pub(super) fn loop_neighbours(&self, eu: EdgeUseId) -> Result<Option<(EdgeUseId, EdgeUseId)>, TopologyError> {
        let EdgeUseParent::LoopUse(lu) = self.edge_use(eu)?.parent else {
            return Ok(None);
        };
        let list = self.loop_use(lu)?.edge_uses();
        let Some(pos) = list.iter().position(|&x| x == eu) else {
            return Err(TopologyError::InvalidTopology(format!(
                "edge-use #{} is missing from its loop",
                self.edge_use(eu)?.index
            )));
        };
        let n = list.len();
        Ok(Some((list[(pos + n - 1) % n], list[(pos + 1) % n])))
    }

    /// Moves every use of `kill` onto `keep` and removes `kill`.
    ///
    /// Edge lines and loop boxes touching the moved uses are recomputed.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` if an edge runs between the two vertices, since it
    /// would shrink to nothing.
    pub fn fuse_vertices(&mut self, keep: VertexId, kill: VertexId) -> Result<()> {
        if keep == kill {
            return Ok(());
        }
        self.vertex(keep)?;
        let edges = self.vertex_edges(kill)?;
        for &e in &edges {
            let (a, b) = self.edge_vertices(e)?;
            if (a == keep && b == kill) || (a == kill && b == keep) {
                return Err(GeometryError::degenerate_at("fusing the ends of an edge", self.edge(e)?.index).into());
            }
        }

        let moved = std::mem::take(&mut self.vertex_mut(kill)?.uses);
        let mut loops = Vec::new();
        for &vu in &moved {
            let data = self.vertex_use_mut(vu)?;
            data.vertex = keep;
            let parent = data.parent;
            match parent {
                VertexUseParent::EdgeUse(eu) => {
                    if let EdgeUseParent::LoopUse(lu) = self.edge_use(eu)?.parent {
                        loops.push(lu);
                    }
                }
                VertexUseParent::LoopUse(lu) => loops.push(lu),
                VertexUseParent::Shell(_) => {}
            }
        }
        self.vertex_mut(keep)?.uses.extend(moved);
        self.vertices.remove(kill);

        for e in edges {
            let (a, b) = self.edge_vertices(e)?;
            let line = Line::through(&self.vertex(a)?.point, &self.vertex(b)?.point)?;
            self.edge_mut(e)?.line = Arc::new(line);
        }
        for lu in loops {
            self.refresh_loop_bbox(lu)?;
        }
        Ok(())
    }

    /// Makes the uses of `other` part of the radial cycle of `keep` and
    /// removes `other`. Both edges must join the same pair of vertices.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTopology` if the end vertices differ.
    pub fn join_edges(&mut self, keep: EdgeId, other: EdgeId) -> Result<()> {
        if keep == other {
            return Ok(());
        }
        let (a, b) = self.edge_vertices(keep)?;
        let (c, d) = self.edge_vertices(other)?;
        if !((a == c && b == d) || (a == d && b == c)) {
            return Err(TopologyError::InvalidTopology(format!(
                "edges #{} and #{} do not share their vertices",
                self.edge(keep)?.index,
                self.edge(other)?.index
            ))
            .into());
        }
        let mut uses = self.edge_uses_of(keep)?;
        uses.extend(self.edge_uses_of(other)?);
        self.relink_radial_uses(keep, &uses)?;
        self.edges.remove(other);
        Ok(())
    }

    /// Joins every pair of edges of `faces` that run between the same two
    /// vertices. Returns the number of edges removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale or a join fails.
    pub fn glue_faces(&mut self, faces: &[FaceId]) -> Result<usize> {
        let mut edges = Vec::new();
        for &f in faces {
            let fu = self.face(f)?.face_use;
            for &lu in &self.face_use(fu)?.loop_uses {
                for &eu in self.loop_use(lu)?.edge_uses() {
                    edges.push(self.edge_use(eu)?.edge);
                }
            }
        }
        self.glue_edges(&edges)
    }

    /// Joins coincident edges across every face, wire loop and wire edge of
    /// the given shells. Returns the number of edges removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale or a join fails.
    pub fn glue_shell_edges(&mut self, shells: &[ShellId]) -> Result<usize> {
        let mut edges = Vec::new();
        for &s in shells {
            edges.extend(self.shell_edges(s)?);
        }
        self.glue_edges(&edges)
    }

    fn glue_edges(&mut self, edges: &[EdgeId]) -> Result<usize> {
        let mut first: HashMap<(VertexId, VertexId), EdgeId> = HashMap::new();
        let mut joined = 0;
        for &e in edges {
            if !self.edges.contains_key(e) {
                continue;
            }
            let (a, b) = self.edge_vertices(e)?;
            let key = if a <= b { (a, b) } else { (b, a) };
            match first.get(&key) {
                Some(&keep) if keep != e => {
                    self.join_edges(keep, e)?;
                    joined += 1;
                }
                Some(_) => {}
                None => {
                    first.insert(key, e);
                }
            }
        }
        Ok(joined)
    }

    /// Swaps which use of a face is its `Same` use, turning the face inside out
    /// with respect to its shell.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for a stale handle.
    pub fn reverse_face(&mut self, f: FaceId) -> Result<()> {
        let fu = self.face(f)?.face_use;
        let fum = self.face_use(fu)?.mate;
        for id in [fu, fum] {
            let data = self.face_use_mut(id)?;
            data.orientation = data.orientation.reversed();
        }
        let face = self.face_mut(f)?;
        face.flip = !face.flip;
        Ok(())
    }

    /// Moves a face, with both of its uses, into another shell.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for stale handles.
    pub fn move_face_use(&mut self, fu: FaceUseId, dest: ShellId) -> Result<()> {
        self.shell(dest)?;
        let data = self.face_use(fu)?;
        let (src, fum) = (data.shell, data.mate);
        if src == dest {
            return Ok(());
        }
        self.shell_mut(src)?.face_uses.retain(|&x| x != fu && x != fum);
        for id in [fu, fum] {
            self.face_use_mut(id)?.shell = dest;
            self.shell_mut(dest)?.face_uses.push(id);
        }
        if let Some(vu) = self.shell(dest)?.vertex_use {
            self.shell_mut(dest)?.vertex_use = None;
            self.remove_vertex_use(vu)?;
        }
        Ok(())
    }

    /// Moves everything `src` owns into `dest` and removes `src`.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for stale handles.
    pub fn join_shells(&mut self, dest: ShellId, src: ShellId) -> Result<()> {
        if dest == src {
            return Ok(());
        }
        self.shell(dest)?;
        let data = self.shell(src)?.clone();
        for &fu in &data.face_uses {
            self.face_use_mut(fu)?.shell = dest;
        }
        for &lu in &data.loop_uses {
            self.loop_use_mut(lu)?.parent = LoopParent::Shell(dest);
        }
        for &eu in &data.edge_uses {
            self.edge_use_mut(eu)?.parent = EdgeUseParent::Shell(dest);
        }
        let lone = data.vertex_use;
        {
            let target = self.shell_mut(dest)?;
            target.face_uses.extend_from_slice(&data.face_uses);
            target.loop_uses.extend_from_slice(&data.loop_uses);
            target.edge_uses.extend_from_slice(&data.edge_uses);
        }
        self.region_mut(data.region)?.shells.retain(|&x| x != src);
        self.shells.remove(src);

        let target = self.shell(dest)?;
        let dest_lone = target.vertex_use;
        let has_other = !(target.face_uses.is_empty() && target.loop_uses.is_empty() && target.edge_uses.is_empty());
        match (dest_lone, lone) {
            (None, Some(vu)) if !has_other => {
                self.vertex_use_mut(vu)?.parent = VertexUseParent::Shell(dest);
                self.shell_mut(dest)?.vertex_use = Some(vu);
            }
            (_, Some(vu)) => self.remove_vertex_use(vu)?,
            (_, None) => {}
        }
        if has_other {
            if let Some(vu) = self.shell(dest)?.vertex_use {
                self.shell_mut(dest)?.vertex_use = None;
                self.remove_vertex_use(vu)?;
            }
        }
        Ok(())
    }

    /// Splits a shell into its boundary components and returns them, `s`
    /// first.
    ///
    /// Two faces belong together when they meet across the material side of
    /// an edge, so solids touching along an edge or at a vertex come apart.
    /// The component with the largest box stays in `s` together with any wire
    /// or lone vertex; each other component moves to a new shell in the same
    /// region.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the shell or a link below it is stale.
    pub fn decompose_shell(&mut self, s: ShellId) -> Result<Vec<ShellId>> {
        let faces = self.shell_faces(s)?;
        if faces.len() < 2 {
            return Ok(vec![s]);
        }
        let slot: HashMap<FaceId, usize> = faces.iter().enumerate().map(|(i, &f)| (f, i)).collect();
        let mut parent: Vec<usize> = (0..faces.len()).collect();
        for (i, &f) in faces.iter().enumerate() {
            let material = self.face_use(self.face_same_use(f)?)?.mate;
            for &lu in &self.face_use(material)?.loop_uses {
                for &eu in self.loop_use(lu)?.edge_uses() {
                    let Some(fu) = self.eu_face_use(self.radial(eu)?)? else {
                        continue;
                    };
                    if let Some(&j) = slot.get(&self.face_use(fu)?.face) {
                        let (a, b) = (find_root(&mut parent, i), find_root(&mut parent, j));
                        parent[a.max(b)] = a.min(b);
                    }
                }
            }
        }

        let mut components: Vec<Vec<FaceId>> = Vec::new();
        let mut component_of: HashMap<usize, usize> = HashMap::new();
        for (i, &f) in faces.iter().enumerate() {
            let root = find_root(&mut parent, i);
            let c = *component_of.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[c].push(f);
        }
        if components.len() == 1 {
            return Ok(vec![s]);
        }

        let mut keep = 0;
        let mut widest = f64::NEG_INFINITY;
        for (c, members) in components.iter().enumerate() {
            let mut bbox = Aabb::empty();
            for &f in members {
                bbox = bbox.union(&self.face(f)?.bbox);
            }
            let diagonal = (bbox.max - bbox.min).norm();
            if diagonal > widest {
                (keep, widest) = (c, diagonal);
            }
        }

        let region = self.shell(s)?.region;
        let mut shells = vec![s];
        for (c, members) in components.iter().enumerate() {
            if c == keep {
                continue;
            }
            let t = self.make_shell(region)?;
            for &f in members {
                let fu = self.face(f)?.face_use;
                self.move_face_use(fu, t)?;
            }
            shells.push(t);
        }
        Ok(shells)
    }

    /// Recomputes the box of a loop and, for a face loop, of its face.
    pub(super) fn refresh_loop_bbox(&mut self, lu: LoopUseId) -> Result<(), TopologyError> {
        let bbox = self.loop_points_bbox(lu)?;
        let data = self.loop_use(lu)?;
        let (lp, parent) = (data.lp, data.parent);
        self.loop_def_mut(lp)?.bbox = bbox;
        if let LoopParent::FaceUse(fu) = parent {
            let face = self.face_use(fu)?.face;
            self.refresh_face_bbox(face)?;
        }
        Ok(())
    }

    /// Recomputes the box of a face from its loops.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn refresh_face_bbox(&mut self, f: FaceId) -> Result<(), TopologyError> {
        let fu = self.face(f)?.face_use;
        let mut bbox = Aabb::empty();
        for &lu in &self.face_use(fu)?.loop_uses {
            bbox = bbox.union(&self.loop_bbox(lu)?);
        }
        self.face_mut(f)?.bbox = bbox;
        Ok(())
    }
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}
