use std::collections::HashSet;

use crate::error::TopologyError;
use crate::math::{Aabb, Point3, Vector3};

use super::{
    EdgeId, EdgeUseId, EdgeUseParent, EntityRef, FaceId, FaceUseId, LoopDown, LoopParent,
    LoopUseId, Model, Orientation, RegionId, ShellId, VertexId, VertexUseParent,
};

impl Model {
    /// Start vertex of an edge-use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn eu_start(&self, eu: EdgeUseId) -> Result<VertexId, TopologyError> {
        let vu = self.edge_use(eu)?.vertex_use;
        Ok(self.vertex_use(vu)?.vertex)
    }

    /// End vertex of an edge-use: the start of its mate.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn eu_end(&self, eu: EdgeUseId) -> Result<VertexId, TopologyError> {
        self.eu_start(self.edge_use(eu)?.mate)
    }

    /// Start and end points of an edge-use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn eu_points(&self, eu: EdgeUseId) -> Result<(Point3, Point3), TopologyError> {
        let a = self.vertex(self.eu_start(eu)?)?.point;
        let b = self.vertex(self.eu_end(eu)?)?.point;
        Ok((a, b))
    }

    /// The two vertices of an edge, in the direction of its reference use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn edge_vertices(&self, e: EdgeId) -> Result<(VertexId, VertexId), TopologyError> {
        let eu = self.edge(e)?.edge_use;
        Ok((self.eu_start(eu)?, self.eu_end(eu)?))
    }

    /// The mate of a use, or `None` for kinds without mates.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for a stale handle.
    pub fn mate(&self, entity: EntityRef) -> Result<Option<EntityRef>, TopologyError> {
        Ok(match entity {
            EntityRef::FaceUse(id) => Some(self.face_use(id)?.mate.into()),
            EntityRef::LoopUse(id) => Some(self.loop_use(id)?.mate.into()),
            EntityRef::EdgeUse(id) => Some(self.edge_use(id)?.mate.into()),
            _ => {
                if !self.contains(entity) {
                    return Err(TopologyError::not_found(entity.kind()));
                }
                None
            }
        })
    }

    /// The next edge-use around the edge, on the adjacent face.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for a stale handle.
    pub fn radial(&self, eu: EdgeUseId) -> Result<EdgeUseId, TopologyError> {
        Ok(self.edge_use(eu)?.radial)
    }

    /// Every edge-use around the edge of `eu`, starting at `eu`.
    ///
    /// The walk alternates radial and mate hops, so it returns to `eu` after
    /// exactly as many steps as the edge has uses.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTopology` if the cycle does not close.
    pub fn radial_cycle(&self, eu: EdgeUseId) -> Result<Vec<EdgeUseId>, TopologyError> {
        let limit = self.edge_uses.len() + 1;
        let mut cycle = vec![eu];
        let mut current = self.radial(eu)?;
        let mut via_radial = true;
        while current != eu {
            if cycle.len() > limit {
                return Err(TopologyError::InvalidTopology(format!(
                    "radial cycle of edge-use #{} does not close",
                    self.edge_use(eu)?.index
                )));
            }
            cycle.push(current);
            let data = self.edge_use(current)?;
            current = if via_radial { data.mate } else { data.radial };
            via_radial = !via_radial;
        }
        Ok(cycle)
    }

    /// All uses of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is stale or its radial cycle is broken.
    pub fn edge_uses_of(&self, e: EdgeId) -> Result<Vec<EdgeUseId>, TopologyError> {
        self.radial_cycle(self.edge(e)?.edge_use)
    }

    /// Number of edge-uses around an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is stale or its radial cycle is broken.
    pub fn edge_use_count(&self, e: EdgeId) -> Result<usize, TopologyError> {
        Ok(self.edge_uses_of(e)?.len())
    }

    /// The entity that directly owns `entity`, or `None` for a region.
    ///
    /// Definitions report their reference use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for a stale handle.
    pub fn parent(&self, entity: EntityRef) -> Result<Option<EntityRef>, TopologyError> {
        Ok(match entity {
            EntityRef::Region(id) => {
                self.region(id)?;
                None
            }
            EntityRef::Shell(id) => Some(self.shell(id)?.region.into()),
            EntityRef::Face(id) => Some(self.face(id)?.face_use.into()),
            EntityRef::FaceUse(id) => Some(self.face_use(id)?.shell.into()),
            EntityRef::Loop(id) => Some(self.loop_def(id)?.loop_use.into()),
            EntityRef::LoopUse(id) => Some(match self.loop_use(id)?.parent {
                LoopParent::FaceUse(fu) => fu.into(),
                LoopParent::Shell(s) => s.into(),
            }),
            EntityRef::Edge(id) => Some(self.edge(id)?.edge_use.into()),
            EntityRef::EdgeUse(id) => Some(match self.edge_use(id)?.parent {
                EdgeUseParent::LoopUse(lu) => lu.into(),
                EdgeUseParent::Shell(s) => s.into(),
            }),
            EntityRef::Vertex(id) => self.vertex(id)?.uses.first().map(|&vu| vu.into()),
            EntityRef::VertexUse(id) => Some(match self.vertex_use(id)?.parent {
                VertexUseParent::EdgeUse(eu) => eu.into(),
                VertexUseParent::LoopUse(lu) => lu.into(),
                VertexUseParent::Shell(s) => s.into(),
            }),
        })
    }

    /// The owners of `entity`, nearest first, ending at its region.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn parent_chain(&self, entity: EntityRef) -> Result<Vec<EntityRef>, TopologyError> {
        let mut chain = Vec::new();
        let mut current = entity;
        while let Some(parent) = self.parent(current)? {
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }

    /// The shell that ultimately owns a use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale, or
    /// `InvalidTopology` if the entity is not below a shell.
    pub fn shell_of(&self, entity: EntityRef) -> Result<ShellId, TopologyError> {
        if let EntityRef::Shell(s) = entity {
            return Ok(s);
        }
        self.parent_chain(entity)?
            .into_iter()
            .find_map(|e| match e {
                EntityRef::Shell(s) => Some(s),
                _ => None,
            })
            .ok_or_else(|| TopologyError::InvalidTopology(format!("{} has no shell", entity.kind())))
    }

    /// The face-use an edge-use belongs to, if it is part of a face.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn eu_face_use(&self, eu: EdgeUseId) -> Result<Option<FaceUseId>, TopologyError> {
        match self.edge_use(eu)?.parent {
            EdgeUseParent::LoopUse(lu) => match self.loop_use(lu)?.parent {
                LoopParent::FaceUse(fu) => Ok(Some(fu)),
                LoopParent::Shell(_) => Ok(None),
            },
            EdgeUseParent::Shell(_) => Ok(None),
        }
    }

    /// Outward normal of a face-use: the plane normal, reversed when
    /// `(orientation != Same) xor face.flip`.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn face_use_normal(&self, fu: FaceUseId) -> Result<Vector3, TopologyError> {
        let data = self.face_use(fu)?;
        let face = self.face(data.face)?;
        let normal = *face.plane.normal();
        if (data.orientation != Orientation::Same) ^ face.flip {
            Ok(-normal)
        } else {
            Ok(normal)
        }
    }

    /// The use of a face whose orientation is `Same`.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn face_same_use(&self, f: FaceId) -> Result<FaceUseId, TopologyError> {
        let fu = self.face(f)?.face_use;
        let data = self.face_use(fu)?;
        if data.orientation == Orientation::Same {
            Ok(fu)
        } else {
            Ok(data.mate)
        }
    }

    /// Outward normal of a face, taken from its `Same` use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn face_normal(&self, f: FaceId) -> Result<Vector3, TopologyError> {
        self.face_use_normal(self.face_same_use(f)?)
    }

    /// Vertices of a loop-use in traversal order.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn loop_vertices(&self, lu: LoopUseId) -> Result<Vec<VertexId>, TopologyError> {
        match &self.loop_use(lu)?.down {
            LoopDown::Edges(eus) => eus.iter().map(|&eu| self.eu_start(eu)).collect(),
            LoopDown::Vertex(vu) => Ok(vec![self.vertex_use(*vu)?.vertex]),
        }
    }

    /// Points of a loop-use in traversal order.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn loop_points(&self, lu: LoopUseId) -> Result<Vec<Point3>, TopologyError> {
        self.loop_vertices(lu)?
            .into_iter()
            .map(|v| Ok(self.vertex(v)?.point))
            .collect()
    }

    /// Boundary polygons of a face, outer first, seen from its `Same` use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn face_loops(&self, f: FaceId) -> Result<Vec<Vec<Point3>>, TopologyError> {
        let fu = self.face_same_use(f)?;
        self.face_use(fu)?
            .loop_uses
            .iter()
            .map(|&lu| self.loop_points(lu))
            .collect()
    }

    /// Distinct faces of a shell, in the order their uses appear.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn shell_faces(&self, s: ShellId) -> Result<Vec<FaceId>, TopologyError> {
        let mut seen = HashSet::new();
        let mut faces = Vec::new();
        for &fu in &self.shell(s)?.face_uses {
            let f = self.face_use(fu)?.face;
            if seen.insert(f) {
                faces.push(f);
            }
        }
        Ok(faces)
    }

    /// Every edge-use owned by a shell: face loops, wire loops and wire edges.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn shell_edge_uses(&self, s: ShellId) -> Result<Vec<EdgeUseId>, TopologyError> {
        let shell = self.shell(s)?;
        let mut eus = Vec::new();
        for &fu in &shell.face_uses {
            for &lu in &self.face_use(fu)?.loop_uses {
                eus.extend_from_slice(self.loop_use(lu)?.edge_uses());
            }
        }
        for &lu in &shell.loop_uses {
            eus.extend_from_slice(self.loop_use(lu)?.edge_uses());
        }
        eus.extend_from_slice(&shell.edge_uses);
        Ok(eus)
    }

    /// Distinct edges of a shell.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn shell_edges(&self, s: ShellId) -> Result<Vec<EdgeId>, TopologyError> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for eu in self.shell_edge_uses(s)? {
            let e = self.edge_use(eu)?.edge;
            if seen.insert(e) {
                edges.push(e);
            }
        }
        Ok(edges)
    }

    /// Distinct vertices of a shell, including vertex loops and a lone vertex.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn shell_vertices(&self, s: ShellId) -> Result<Vec<VertexId>, TopologyError> {
        let shell = self.shell(s)?;
        let mut seen = HashSet::new();
        let mut vertices = Vec::new();
        let mut push = |v: VertexId| {
            if seen.insert(v) {
                vertices.push(v);
            }
        };
        let mut loop_uses: Vec<LoopUseId> = shell.loop_uses.clone();
        for &fu in &shell.face_uses {
            loop_uses.extend_from_slice(&self.face_use(fu)?.loop_uses);
        }
        for lu in loop_uses {
            for v in self.loop_vertices(lu)? {
                push(v);
            }
        }
        for &eu in &shell.edge_uses {
            push(self.eu_start(eu)?);
        }
        if let Some(vu) = shell.vertex_use {
            push(self.vertex_use(vu)?.vertex);
        }
        Ok(vertices)
    }

    /// Distinct edges incident to a vertex.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn vertex_edges(&self, v: VertexId) -> Result<Vec<EdgeId>, TopologyError> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for &vu in &self.vertex(v)?.uses {
            if let VertexUseParent::EdgeUse(eu) = self.vertex_use(vu)?.parent {
                let e = self.edge_use(eu)?.edge;
                if seen.insert(e) {
                    edges.push(e);
                }
            }
        }
        Ok(edges)
    }

    /// Stored bounding box of a face.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for a stale handle.
    pub fn face_bbox(&self, f: FaceId) -> Result<Aabb, TopologyError> {
        Ok(self.face(f)?.bbox)
    }

    /// Stored bounding box of the loop behind a loop-use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for a stale handle.
    pub fn loop_bbox(&self, lu: LoopUseId) -> Result<Aabb, TopologyError> {
        Ok(self.loop_def(self.loop_use(lu)?.lp)?.bbox)
    }

    /// Bounding box of everything a shell owns.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn shell_bbox(&self, s: ShellId) -> Result<Aabb, TopologyError> {
        let shell = self.shell(s)?;
        let mut bbox = Aabb::empty();
        for f in self.shell_faces(s)? {
            bbox = bbox.union(&self.face(f)?.bbox);
        }
        for &lu in &shell.loop_uses {
            bbox = bbox.union(&self.loop_bbox(lu)?);
        }
        for &eu in &shell.edge_uses {
            let (a, b) = self.eu_points(eu)?;
            bbox.grow(&a);
            bbox.grow(&b);
        }
        if let Some(vu) = shell.vertex_use {
            bbox.grow(&self.vertex(self.vertex_use(vu)?.vertex)?.point);
        }
        Ok(bbox)
    }

    /// Bounding box of every shell in a region.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if any link on the way is stale.
    pub fn region_bbox(&self, r: RegionId) -> Result<Aabb, TopologyError> {
        let mut bbox = Aabb::empty();
        for &s in &self.region(r)?.shells {
            bbox = bbox.union(&self.shell_bbox(s)?);
        }
        Ok(bbox)
    }

    pub(super) fn loop_points_bbox(&self, lu: LoopUseId) -> Result<Aabb, TopologyError> {
        Ok(Aabb::from_points(&self.loop_points(lu)?))
    }
}
