mod copy;
mod edge;
mod entity;
mod face;
mod keys;
mod kill;
mod loops;
mod make;
mod modify;
mod query;
mod radial;
mod region;
mod shell;
mod vertex;
mod visit;

pub use edge::{EdgeData, EdgeUseData, EdgeUseParent};
pub use entity::{EntityKind, EntityRef, Orientation};
pub use face::{FaceData, FaceUseData};
pub use keys::{
    EdgeId, EdgeUseId, FaceId, FaceUseId, LoopId, LoopUseId, RegionId, ShellId, VertexId,
    VertexUseId,
};
pub use loops::{LoopData, LoopDown, LoopParent, LoopUseData};
pub use make::Corner;
pub use region::RegionData;
pub use shell::ShellData;
pub use vertex::{VertexData, VertexUseData, VertexUseParent};
pub use visit::{StructCounts, Visitor};

use slotmap::SlotMap;

use crate::error::TopologyError;

/// One topological universe: every region, shell, face, loop, edge and vertex,
/// with their uses, in per-kind arenas.
///
/// Entities refer to each other through generational keys, so a handle to a
/// destroyed entity is reported as `EntityNotFound` instead of dangling. All
/// mutation goes through the constructive, modifying and killing operations
/// on this type; the arenas themselves are private. Every entity receives a
/// model-unique index from a counter owned by the model, never reused.
///
/// `Model` is `Clone`: a clone is a complete snapshot that an operation can
/// roll back to.
#[derive(Debug, Clone)]
pub struct Model {
    max_index: u64,
    region_order: Vec<RegionId>,
    regions: SlotMap<RegionId, RegionData>,
    shells: SlotMap<ShellId, ShellData>,
    faces: SlotMap<FaceId, FaceData>,
    face_uses: SlotMap<FaceUseId, FaceUseData>,
    loops: SlotMap<LoopId, LoopData>,
    loop_uses: SlotMap<LoopUseId, LoopUseData>,
    edges: SlotMap<EdgeId, EdgeData>,
    edge_uses: SlotMap<EdgeUseId, EdgeUseData>,
    vertices: SlotMap<VertexId, VertexData>,
    vertex_uses: SlotMap<VertexUseId, VertexUseData>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Creates a new, empty model. The model itself holds index 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_index: 1,
            region_order: Vec::new(),
            regions: SlotMap::with_key(),
            shells: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            face_uses: SlotMap::with_key(),
            loops: SlotMap::with_key(),
            loop_uses: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            edge_uses: SlotMap::with_key(),
            vertices: SlotMap::with_key(),
            vertex_uses: SlotMap::with_key(),
        }
    }

    /// One past the highest index handed out so far.
    ///
    /// Side tables keyed by entity index can be sized with this.
    #[must_use]
    pub fn max_index(&self) -> u64 {
        self.max_index
    }

    fn alloc_index(&mut self) -> u64 {
        let index = self.max_index;
        self.max_index += 1;
        index
    }

    /// Regions in creation order.
    #[must_use]
    pub fn regions(&self) -> &[RegionId] {
        &self.region_order
    }

    /// Returns `true` if the handle refers to a live entity of this model.
    #[must_use]
    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Region(id) => self.regions.contains_key(id),
            EntityRef::Shell(id) => self.shells.contains_key(id),
            EntityRef::Face(id) => self.faces.contains_key(id),
            EntityRef::FaceUse(id) => self.face_uses.contains_key(id),
            EntityRef::Loop(id) => self.loops.contains_key(id),
            EntityRef::LoopUse(id) => self.loop_uses.contains_key(id),
            EntityRef::Edge(id) => self.edges.contains_key(id),
            EntityRef::EdgeUse(id) => self.edge_uses.contains_key(id),
            EntityRef::Vertex(id) => self.vertices.contains_key(id),
            EntityRef::VertexUse(id) => self.vertex_uses.contains_key(id),
        }
    }

    /// The model-unique index of an entity.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for a stale or foreign handle.
    pub fn index_of(&self, entity: EntityRef) -> Result<u64, TopologyError> {
        Ok(match entity {
            EntityRef::Region(id) => self.region(id)?.index,
            EntityRef::Shell(id) => self.shell(id)?.index,
            EntityRef::Face(id) => self.face(id)?.index,
            EntityRef::FaceUse(id) => self.face_use(id)?.index,
            EntityRef::Loop(id) => self.loop_def(id)?.index,
            EntityRef::LoopUse(id) => self.loop_use(id)?.index,
            EntityRef::Edge(id) => self.edge(id)?.index,
            EntityRef::EdgeUse(id) => self.edge_use(id)?.index,
            EntityRef::Vertex(id) => self.vertex(id)?.index,
            EntityRef::VertexUse(id) => self.vertex_use(id)?.index,
        })
    }

    // --- Region ---

    /// Returns a reference to the region data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn region(&self, id: RegionId) -> Result<&RegionData, TopologyError> {
        self.regions
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Region))
    }

    fn region_mut(&mut self, id: RegionId) -> Result<&mut RegionData, TopologyError> {
        self.regions
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Region))
    }

    /// Iterates over every live region.
    pub fn iter_regions(&self) -> impl Iterator<Item = (RegionId, &RegionData)> + '_ {
        self.regions.iter()
    }

    // --- Shell ---

    /// Returns a reference to the shell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn shell(&self, id: ShellId) -> Result<&ShellData, TopologyError> {
        self.shells
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Shell))
    }

    fn shell_mut(&mut self, id: ShellId) -> Result<&mut ShellData, TopologyError> {
        self.shells
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Shell))
    }

    /// Iterates over every live shell.
    pub fn iter_shells(&self) -> impl Iterator<Item = (ShellId, &ShellData)> + '_ {
        self.shells.iter()
    }

    // --- Face ---

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Face))
    }

    fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Face))
    }

    /// Iterates over every live face.
    pub fn iter_faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> + '_ {
        self.faces.iter()
    }

    // --- FaceUse ---

    /// Returns a reference to the face-use data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn face_use(&self, id: FaceUseId) -> Result<&FaceUseData, TopologyError> {
        self.face_uses
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::FaceUse))
    }

    fn face_use_mut(&mut self, id: FaceUseId) -> Result<&mut FaceUseData, TopologyError> {
        self.face_uses
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::FaceUse))
    }

    /// Iterates over every live face-use.
    pub fn iter_face_uses(&self) -> impl Iterator<Item = (FaceUseId, &FaceUseData)> + '_ {
        self.face_uses.iter()
    }

    // --- Loop ---

    /// Returns a reference to the loop data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn loop_def(&self, id: LoopId) -> Result<&LoopData, TopologyError> {
        self.loops
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Loop))
    }

    fn loop_def_mut(&mut self, id: LoopId) -> Result<&mut LoopData, TopologyError> {
        self.loops
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Loop))
    }

    /// Iterates over every live loop.
    pub fn iter_loops(&self) -> impl Iterator<Item = (LoopId, &LoopData)> + '_ {
        self.loops.iter()
    }

    // --- LoopUse ---

    /// Returns a reference to the loop-use data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn loop_use(&self, id: LoopUseId) -> Result<&LoopUseData, TopologyError> {
        self.loop_uses
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::LoopUse))
    }

    fn loop_use_mut(&mut self, id: LoopUseId) -> Result<&mut LoopUseData, TopologyError> {
        self.loop_uses
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::LoopUse))
    }

    /// Iterates over every live loop-use.
    pub fn iter_loop_uses(&self) -> impl Iterator<Item = (LoopUseId, &LoopUseData)> + '_ {
        self.loop_uses.iter()
    }

    // --- Edge ---

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Edge))
    }

    fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Edge))
    }

    /// Iterates over every live edge.
    pub fn iter_edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> + '_ {
        self.edges.iter()
    }

    // --- EdgeUse ---

    /// Returns a reference to the edge-use data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn edge_use(&self, id: EdgeUseId) -> Result<&EdgeUseData, TopologyError> {
        self.edge_uses
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::EdgeUse))
    }

    fn edge_use_mut(&mut self, id: EdgeUseId) -> Result<&mut EdgeUseData, TopologyError> {
        self.edge_uses
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::EdgeUse))
    }

    /// Iterates over every live edge-use.
    pub fn iter_edge_uses(&self) -> impl Iterator<Item = (EdgeUseId, &EdgeUseData)> + '_ {
        self.edge_uses.iter()
    }

    // --- Vertex ---

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Vertex))
    }

    fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Vertex))
    }

    /// Iterates over every live vertex.
    pub fn iter_vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> + '_ {
        self.vertices.iter()
    }

    // --- VertexUse ---

    /// Returns a reference to the vertex-use data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn vertex_use(&self, id: VertexUseId) -> Result<&VertexUseData, TopologyError> {
        self.vertex_uses
            .get(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::VertexUse))
    }

    fn vertex_use_mut(&mut self, id: VertexUseId) -> Result<&mut VertexUseData, TopologyError> {
        self.vertex_uses
            .get_mut(id)
            .ok_or_else(|| TopologyError::not_found(EntityKind::VertexUse))
    }

    /// Iterates over every live vertex-use.
    pub fn iter_vertex_uses(&self) -> impl Iterator<Item = (VertexUseId, &VertexUseData)> + '_ {
        self.vertex_uses.iter()
    }
}
