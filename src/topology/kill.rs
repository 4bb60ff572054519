use std::collections::{HashMap, HashSet};

use crate::error::{Result, TopologyError};

use super::{
    EdgeId, EdgeUseId, EdgeUseParent, EntityKind, EntityRef, FaceUseId, LoopDown, LoopParent,
    LoopUseId, Model, RegionId, ShellId, VertexUseId, VertexUseParent,
};

impl Model {
    /// Removes a face: both of its uses, their loops, edge-uses and
    /// vertex-uses. Radial cycles of the edges it touched are re-linked;
    /// edges and vertices left without uses are released.
    ///
    /// # Errors
    ///
    /// Returns an error if the face-use is stale or a radial cycle it touches
    /// is broken. Nothing is modified in that case.
    pub fn kill_face_use(&mut self, fu: FaceUseId) -> Result<()> {
        let data = self.face_use(fu)?;
        let fum = data.mate;
        let face = data.face;
        let shell = data.shell;
        let mut loop_uses = data.loop_uses.clone();
        loop_uses.extend_from_slice(&self.face_use(fum)?.loop_uses);

        self.remove_loop_uses(&loop_uses)?;

        let shell_data = self.shell_mut(shell)?;
        shell_data.face_uses.retain(|&x| x != fu && x != fum);
        self.faces.remove(face);
        self.face_uses.remove(fu);
        self.face_uses.remove(fum);
        Ok(())
    }

    /// Removes a loop and both of its uses.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTopology` if the loop is the only one of its face;
    /// remove the face instead.
    pub fn kill_loop_use(&mut self, lu: LoopUseId) -> Result<()> {
        let data = self.loop_use(lu)?;
        let lum = data.mate;
        let parent = data.parent;
        let mate_parent = self.loop_use(lum)?.parent;

        if let LoopParent::FaceUse(fu) = parent {
            if self.face_use(fu)?.loop_uses.len() <= 1 {
                return Err(TopologyError::InvalidTopology(format!(
                    "loop-use #{} is the only loop of its face",
                    data.index
                ))
                .into());
            }
        }

        self.remove_loop_uses(&[lu, lum])?;
        for p in [parent, mate_parent] {
            match p {
                LoopParent::FaceUse(fu) => self.face_use_mut(fu)?.loop_uses.retain(|&x| x != lu && x != lum),
                LoopParent::Shell(s) => self.shell_mut(s)?.loop_uses.retain(|&x| x != lu && x != lum),
            }
        }
        Ok(())
    }

    /// Removes a wire edge and its mate from their shell.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTopology` if the edge-use belongs to a loop.
    pub fn kill_wire_edge(&mut self, eu: EdgeUseId) -> Result<()> {
        let data = self.edge_use(eu)?;
        let EdgeUseParent::Shell(shell) = data.parent else {
            return Err(TopologyError::InvalidTopology(format!(
                "edge-use #{} belongs to a loop",
                data.index
            ))
            .into());
        };
        let mate = data.mate;
        self.remove_edge_uses(&[eu, mate])?;
        self.shell_mut(shell)?.edge_uses.retain(|&x| x != eu && x != mate);
        Ok(())
    }

    /// Removes a vertex-use owned by a shell or a vertex loop. A vertex loop
    /// goes with its only vertex.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTopology` for the vertex-use of an edge-use.
    pub fn kill_vertex_use(&mut self, vu: VertexUseId) -> Result<()> {
        match self.vertex_use(vu)?.parent {
            VertexUseParent::Shell(s) => {
                self.shell_mut(s)?.vertex_use = None;
                Ok(self.remove_vertex_use(vu)?)
            }
            VertexUseParent::LoopUse(lu) => self.kill_loop_use(lu),
            VertexUseParent::EdgeUse(eu) => Err(TopologyError::InvalidTopology(format!(
                "vertex-use #{} starts edge-use #{}",
                self.vertex_use(vu)?.index,
                self.edge_use(eu)?.index
            ))
            .into()),
        }
    }

    /// Removes everything a shell owns, leaving it empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle on the way is stale.
    pub fn empty_shell(&mut self, s: ShellId) -> Result<()> {
        let faces = self.shell_faces(s)?;
        for f in faces {
            let fu = self.face(f)?.face_use;
            self.kill_face_use(fu)?;
        }
        let shell = self.shell(s)?;
        let loop_uses = shell.loop_uses.clone();
        let edge_uses = shell.edge_uses.clone();
        let vertex_use = shell.vertex_use;
        self.remove_loop_uses(&loop_uses)?;
        self.remove_edge_uses(&edge_uses)?;
        let shell = self.shell_mut(s)?;
        shell.loop_uses.clear();
        shell.edge_uses.clear();
        shell.vertex_use = None;
        if let Some(vu) = vertex_use {
            self.remove_vertex_use(vu)?;
        }
        Ok(())
    }

    /// Removes a shell and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle on the way is stale.
    pub fn kill_shell(&mut self, s: ShellId) -> Result<()> {
        self.empty_shell(s)?;
        self.remove_empty_shell(s)
    }

    /// Removes a region and all of its shells.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle on the way is stale.
    pub fn kill_region(&mut self, r: RegionId) -> Result<()> {
        let shells = self.region(r)?.shells.clone();
        for s in shells {
            self.kill_shell(s)?;
        }
        self.region_order.retain(|&x| x != r);
        self.regions.remove(r);
        Ok(())
    }

    /// Removes a single entity that nothing refers to any more.
    ///
    /// Only empty regions and empty shells can be destroyed this way; every
    /// other entity is referenced by its mate, parent or uses for as long as it
    /// lives, and is removed by the `kill_*` operation of its owner.
    ///
    /// # Errors
    ///
    /// Returns `InUse` with the indices of the referring entities, or
    /// `EntityNotFound` for a stale handle.
    pub fn destroy(&mut self, entity: EntityRef) -> Result<()> {
        let users = self.users_of(entity)?;
        if !users.is_empty() {
            return Err(TopologyError::InUse {
                kind: entity.kind(),
                index: self.index_of(entity)?,
                users,
            }
            .into());
        }
        match entity {
            EntityRef::Region(r) => {
                self.region_order.retain(|&x| x != r);
                self.regions.remove(r);
                Ok(())
            }
            EntityRef::Shell(s) => self.remove_empty_shell(s),
            // A live definition or use always has users.
            _ => Err(TopologyError::InvalidTopology(format!("cannot destroy a {}", entity.kind())).into()),
        }
    }

    /// Indices of the live entities that refer to `entity`.
    fn users_of(&self, entity: EntityRef) -> Result<Vec<u64>, TopologyError> {
        let mut refs: Vec<EntityRef> = Vec::new();
        match entity {
            EntityRef::Region(r) => refs.extend(self.region(r)?.shells.iter().map(|&s| EntityRef::from(s))),
            EntityRef::Shell(s) => {
                let data = self.shell(s)?;
                refs.extend(data.face_uses.iter().map(|&x| EntityRef::from(x)));
                refs.extend(data.loop_uses.iter().map(|&x| EntityRef::from(x)));
                refs.extend(data.edge_uses.iter().map(|&x| EntityRef::from(x)));
                refs.extend(data.vertex_use.map(EntityRef::from));
            }
            EntityRef::Face(f) => {
                let fu = self.face(f)?.face_use;
                refs.push(fu.into());
                refs.push(self.face_use(fu)?.mate.into());
            }
            EntityRef::Loop(l) => {
                let lu = self.loop_def(l)?.loop_use;
                refs.push(lu.into());
                refs.push(self.loop_use(lu)?.mate.into());
            }
            EntityRef::Edge(e) => refs.extend(self.edge_uses_of(e)?.into_iter().map(EntityRef::from)),
            EntityRef::Vertex(v) => refs.extend(self.vertex(v)?.uses.iter().map(|&vu| EntityRef::from(vu))),
            EntityRef::FaceUse(_) | EntityRef::LoopUse(_) | EntityRef::EdgeUse(_) | EntityRef::VertexUse(_) => {
                if let Some(mate) = self.mate(entity)? {
                    refs.push(mate);
                }
                refs.extend(self.parent(entity)?);
            }
        }
        refs.into_iter().map(|r| self.index_of(r)).collect()
    }

    fn remove_empty_shell(&mut self, s: ShellId) -> Result<()> {
        let region = self.shell(s)?.region;
        self.region_mut(region)?.shells.retain(|&x| x != s);
        self.shells.remove(s);
        Ok(())
    }

    /// Removes loop-uses with their loops, edge-uses and vertex-uses. Does not
    /// touch the parents' lists.
    pub(super) fn remove_loop_uses(&mut self, loop_uses: &[LoopUseId]) -> Result<()> {
        let mut eus = Vec::new();
        let mut vus = Vec::new();
        for &lu in loop_uses {
            match &self.loop_use(lu)?.down {
                LoopDown::Edges(list) => eus.extend_from_slice(list),
                LoopDown::Vertex(vu) => vus.push(*vu),
            }
        }
        self.remove_edge_uses(&eus)?;
        for vu in vus {
            self.remove_vertex_use(vu)?;
        }
        for &lu in loop_uses {
            if let Some(data) = self.loop_uses.remove(lu) {
                self.loops.remove(data.lp);
            }
        }
        Ok(())
    }

    /// Removes edge-uses, which must come with their mates, from their radial
    /// cycles. Remaining uses of each edge are re-linked; an edge without uses
    /// is released. Does not touch the parents' lists.
    pub(super) fn remove_edge_uses(&mut self, eus: &[EdgeUseId]) -> Result<()> {
        let doomed: HashSet<EdgeUseId> = eus.iter().copied().collect();
        let mut survivors: HashMap<EdgeId, Vec<EdgeUseId>> = HashMap::new();
        let mut order: Vec<EdgeId> = Vec::new();
        for &eu in eus {
            let e = self.edge_use(eu)?.edge;
            if survivors.contains_key(&e) {
                continue;
            }
            let rest: Vec<EdgeUseId> = self
                .edge_uses_of(e)?
                .into_iter()
                .filter(|u| !doomed.contains(u))
                .collect();
            survivors.insert(e, rest);
            order.push(e);
        }

        for &eu in eus {
            let vu = self.edge_use(eu)?.vertex_use;
            self.remove_vertex_use(vu)?;
            self.edge_uses.remove(eu);
        }
        for e in order {
            let rest = survivors.remove(&e).unwrap_or_default();
            if rest.is_empty() {
                self.edges.remove(e);
            } else {
                self.relink_radial_uses(e, &rest)?;
            }
        }
        Ok(())
    }

    /// Removes a vertex-use and releases its vertex if that was the last use.
    pub(super) fn remove_vertex_use(&mut self, vu: VertexUseId) -> Result<(), TopologyError> {
        let Some(data) = self.vertex_uses.remove(vu) else {
            return Err(TopologyError::not_found(EntityKind::VertexUse));
        };
        let vertex = self.vertex_mut(data.vertex)?;
        vertex.uses.retain(|&x| x != vu);
        if vertex.uses.is_empty() {
            self.vertices.remove(data.vertex);
        }
        Ok(())
    }
}
