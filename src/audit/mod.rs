//! Read-only consistency checks over the radial-edge structure.
//!
//! [`check`] looks at one entity and its immediate neighbours; [`check_model`]
//! walks everything and adds the model-wide checks (index uniqueness,
//! reachability). Neither modifies the model, and neither panics on a broken
//! structure: every violation comes back as a [`Defect`].

mod geometry;

pub use geometry::check_geometry;

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::error::TopologyError;
use crate::topology::{
    EdgeId, EdgeUseId, EdgeUseParent, EntityKind, EntityRef, FaceId, FaceUseId, LoopDown, LoopId,
    LoopParent, LoopUseId, Model, Orientation, RegionId, ShellId, StructCounts, VertexId,
    VertexUseId, VertexUseParent,
};

/// The invariant a defect violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefectKind {
    /// A link points at an entity that does not exist.
    Dangling,
    /// `mate(mate(u)) != u`, or mates disagree on their definition or parent.
    MateMismatch,
    /// Face-use mates without opposite orientations, or loop-use mates that disagree.
    MateOrientation,
    /// The radial walk around an edge does not close.
    RadialOpen,
    /// `radial(radial(u)) != u`, or radial neighbours on different edges.
    RadialMismatch,
    /// Radial neighbours that run the same way along the edge.
    RadialDirection,
    /// Radial neighbours on different faces of one shell whose face-uses have
    /// different orientations.
    RadialOrientation,
    /// A child missing from its parent's list, or a back-link that disagrees.
    ParentMismatch,
    /// A definition whose uses do not point back at it.
    DefinitionMismatch,
    /// A face-use without loops, or a loop-use with neither edges nor a vertex.
    EmptyLoop,
    /// Consecutive edge-uses of a loop that do not meet.
    LoopNotClosed,
    /// A vertex without uses.
    UnusedVertex,
    /// A lone shell vertex next to other contents.
    LoneVertex,
    /// Two live entities with one index, or an index the model never handed out.
    BadIndex,
    /// An entity that is stored but not reachable from any region.
    Unreachable,
    /// An edge whose two ends are the same point within tolerance.
    ZeroLengthEdge,
    /// A loop vertex off its face plane.
    OffPlane,
    /// A loop wound against the orientation its use claims.
    WrongWinding,
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Dangling => "dangling link",
            Self::MateMismatch => "mate mismatch",
            Self::MateOrientation => "mate orientation",
            Self::RadialOpen => "open radial cycle",
            Self::RadialMismatch => "radial mismatch",
            Self::RadialDirection => "radial direction",
            Self::RadialOrientation => "radial orientation",
            Self::ParentMismatch => "parent mismatch",
            Self::DefinitionMismatch => "definition mismatch",
            Self::EmptyLoop => "empty loop",
            Self::LoopNotClosed => "loop not closed",
            Self::UnusedVertex => "unused vertex",
            Self::LoneVertex => "lone vertex beside other contents",
            Self::BadIndex => "bad index",
            Self::Unreachable => "unreachable entity",
            Self::ZeroLengthEdge => "zero-length edge",
            Self::OffPlane => "vertex off face plane",
            Self::WrongWinding => "loop wound against its orientation",
        };
        f.write_str(text)
    }
}

/// One invariant violation: what is wrong and where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {entity} #{index}")]
pub struct Defect {
    pub kind: DefectKind,
    pub entity: EntityKind,
    pub index: u64,
}

impl Defect {
    #[must_use]
    pub fn new(kind: DefectKind, entity: EntityKind, index: u64) -> Self {
        Self {
            kind,
            entity,
            index,
        }
    }
}

/// Checks the invariants local to one entity.
///
/// # Errors
///
/// Returns the first defect found. A stale handle is reported as `Dangling`
/// with index 0.
pub fn check(model: &Model, entity: EntityRef) -> Result<(), Defect> {
    let auditor = Auditor { model };
    match entity {
        EntityRef::Region(id) => auditor.region(id),
        EntityRef::Shell(id) => auditor.shell(id),
        EntityRef::Face(id) => auditor.face(id),
        EntityRef::FaceUse(id) => auditor.face_use(id),
        EntityRef::Loop(id) => auditor.loop_def(id),
        EntityRef::LoopUse(id) => auditor.loop_use(id),
        EntityRef::Edge(id) => auditor.edge(id),
        EntityRef::EdgeUse(id) => auditor.edge_use(id),
        EntityRef::Vertex(id) => auditor.vertex(id),
        EntityRef::VertexUse(id) => auditor.vertex_use(id),
    }
}

/// Checks every entity of the model, plus index uniqueness and reachability.
/// Returns every defect found; an empty list means the model is consistent.
#[must_use]
pub fn check_model(model: &Model) -> Vec<Defect> {
    let mut defects = Vec::new();
    let mut push = |r: Result<(), Defect>| {
        if let Err(d) = r {
            defects.push(d);
        }
    };
    let mut entities: Vec<EntityRef> = Vec::new();
    entities.extend(model.iter_regions().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_shells().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_faces().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_face_uses().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_loops().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_loop_uses().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_edges().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_edge_uses().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_vertices().map(|(k, _)| EntityRef::from(k)));
    entities.extend(model.iter_vertex_uses().map(|(k, _)| EntityRef::from(k)));

    let mut seen: HashMap<u64, EntityKind> = HashMap::with_capacity(entities.len());
    for &entity in &entities {
        push(check(model, entity));
        if let Ok(index) = model.index_of(entity) {
            if index == 0 || index >= model.max_index() || seen.insert(index, entity.kind()).is_some() {
                push(Err(Defect::new(DefectKind::BadIndex, entity.kind(), index)));
            }
        }
    }

    match StructCounts::of_model(model) {
        Ok(reached) if reached == StructCounts::stored(model) => {}
        Ok(_) => push(Err(Defect::new(DefectKind::Unreachable, EntityKind::Model, 0))),
        Err(_) => push(Err(Defect::new(DefectKind::Dangling, EntityKind::Model, 0))),
    }
    for &r in model.regions() {
        if model.region(r).is_err() {
            push(Err(Defect::new(DefectKind::Dangling, EntityKind::Model, 0)));
        }
    }
    if !defects.is_empty() {
        debug!(count = defects.len(), first = %defects[0], "model audit found defects");
    }
    defects
}

struct Auditor<'a> {
    model: &'a Model,
}

/// Turns a failed lookup into a `Dangling` defect blamed on `kind #index`.
fn link<T>(found: Result<T, TopologyError>, kind: EntityKind, index: u64) -> Result<T, Defect> {
    found.map_err(|_| Defect::new(DefectKind::Dangling, kind, index))
}

fn ensure(ok: bool, kind: DefectKind, entity: EntityKind, index: u64) -> Result<(), Defect> {
    if ok {
        Ok(())
    } else {
        Err(Defect::new(kind, entity, index))
    }
}

fn stale(kind: EntityKind) -> Defect {
    Defect::new(DefectKind::Dangling, kind, 0)
}

impl Auditor<'_> {
    fn region(&self, id: RegionId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::Region;
        let m = self.model;
        let data = m.region(id).map_err(|_| stale(K))?;
        for &s in &data.shells {
            let shell = link(m.shell(s), K, data.index)?;
            ensure(shell.region == id, DefectKind::ParentMismatch, K, data.index)?;
        }
        ensure(m.regions().contains(&id), DefectKind::ParentMismatch, K, data.index)
    }

    fn shell(&self, id: ShellId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::Shell;
        let m = self.model;
        let data = m.shell(id).map_err(|_| stale(K))?;
        let i = data.index;
        let region = link(m.region(data.region), K, i)?;
        ensure(region.shells.contains(&id), DefectKind::ParentMismatch, K, i)?;
        for &fu in &data.face_uses {
            ensure(link(m.face_use(fu), K, i)?.shell == id, DefectKind::ParentMismatch, K, i)?;
        }
        for &lu in &data.loop_uses {
            let parent = link(m.loop_use(lu), K, i)?.parent;
            ensure(parent == LoopParent::Shell(id), DefectKind::ParentMismatch, K, i)?;
        }
        for &eu in &data.edge_uses {
            let parent = link(m.edge_use(eu), K, i)?.parent;
            ensure(parent == EdgeUseParent::Shell(id), DefectKind::ParentMismatch, K, i)?;
        }
        if let Some(vu) = data.vertex_use {
            let parent = link(m.vertex_use(vu), K, i)?.parent;
            ensure(parent == VertexUseParent::Shell(id), DefectKind::ParentMismatch, K, i)?;
            let alone = data.face_uses.is_empty() && data.loop_uses.is_empty() && data.edge_uses.is_empty();
            ensure(alone, DefectKind::LoneVertex, K, i)?;
        }
        Ok(())
    }

    fn face(&self, id: FaceId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::Face;
        let m = self.model;
        let data = m.face(id).map_err(|_| stale(K))?;
        let i = data.index;
        let fu = link(m.face_use(data.face_use), K, i)?;
        let mate = link(m.face_use(fu.mate), K, i)?;
        ensure(fu.face == id && mate.face == id, DefectKind::DefinitionMismatch, K, i)?;
        let n = data.plane.normal();
        ensure(n.iter().all(|c| c.is_finite()), DefectKind::DefinitionMismatch, K, i)
    }

    fn face_use(&self, id: FaceUseId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::FaceUse;
        let m = self.model;
        let data = m.face_use(id).map_err(|_| stale(K))?;
        let i = data.index;
        let shell = link(m.shell(data.shell), K, i)?;
        ensure(shell.face_uses.contains(&id), DefectKind::ParentMismatch, K, i)?;
        link(m.face(data.face), K, i)?;

        let mate = link(m.face_use(data.mate), K, i)?;
        ensure(data.mate != id && mate.mate == id && mate.face == data.face, DefectKind::MateMismatch, K, i)?;
        ensure(mate.shell == data.shell, DefectKind::MateMismatch, K, i)?;
        let paired = matches!(
            (data.orientation, mate.orientation),
            (Orientation::Same, Orientation::Opposite) | (Orientation::Opposite, Orientation::Same)
        );
        ensure(paired, DefectKind::MateOrientation, K, i)?;

        ensure(!data.loop_uses.is_empty(), DefectKind::EmptyLoop, K, i)?;
        ensure(data.loop_uses.len() == mate.loop_uses.len(), DefectKind::MateMismatch, K, i)?;
        for &lu in &data.loop_uses {
            let lu_data = link(m.loop_use(lu), K, i)?;
            ensure(lu_data.parent == LoopParent::FaceUse(id), DefectKind::ParentMismatch, K, i)?;
            ensure(mate.loop_uses.contains(&lu_data.mate), DefectKind::MateMismatch, K, i)?;
        }
        Ok(())
    }

    fn loop_def(&self, id: LoopId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::Loop;
        let m = self.model;
        let data = m.loop_def(id).map_err(|_| stale(K))?;
        let lu = link(m.loop_use(data.loop_use), K, data.index)?;
        let mate = link(m.loop_use(lu.mate), K, data.index)?;
        ensure(lu.lp == id && mate.lp == id, DefectKind::DefinitionMismatch, K, data.index)
    }

    fn loop_use(&self, id: LoopUseId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::LoopUse;
        let m = self.model;
        let data = m.loop_use(id).map_err(|_| stale(K))?;
        let i = data.index;
        let listed = match data.parent {
            LoopParent::FaceUse(fu) => link(m.face_use(fu), K, i)?.loop_uses.contains(&id),
            LoopParent::Shell(s) => link(m.shell(s), K, i)?.loop_uses.contains(&id),
        };
        ensure(listed, DefectKind::ParentMismatch, K, i)?;
        link(m.loop_def(data.lp), K, i)?;

        let mate = link(m.loop_use(data.mate), K, i)?;
        ensure(data.mate != id && mate.mate == id && mate.lp == data.lp, DefectKind::MateMismatch, K, i)?;
        ensure(mate.orientation == data.orientation, DefectKind::MateOrientation, K, i)?;
        let expected = match data.parent {
            LoopParent::FaceUse(_) => data.orientation != Orientation::Unspecified,
            LoopParent::Shell(_) => data.orientation == Orientation::Unspecified,
        };
        ensure(expected, DefectKind::MateOrientation, K, i)?;

        match &data.down {
            LoopDown::Vertex(vu) => {
                let parent = link(m.vertex_use(*vu), K, i)?.parent;
                ensure(parent == VertexUseParent::LoopUse(id), DefectKind::ParentMismatch, K, i)?;
                ensure(matches!(mate.down, LoopDown::Vertex(_)), DefectKind::MateMismatch, K, i)
            }
            LoopDown::Edges(eus) => {
                ensure(!eus.is_empty(), DefectKind::EmptyLoop, K, i)?;
                ensure(mate.edge_uses().len() == eus.len(), DefectKind::MateMismatch, K, i)?;
                for (j, &eu) in eus.iter().enumerate() {
                    let eu_data = link(m.edge_use(eu), K, i)?;
                    ensure(eu_data.parent == EdgeUseParent::LoopUse(id), DefectKind::ParentMismatch, K, i)?;
                    let next = eus[(j + 1) % eus.len()];
                    let end = link(m.eu_end(eu), K, i)?;
                    let start = link(m.eu_start(next), K, i)?;
                    ensure(end == start, DefectKind::LoopNotClosed, K, i)?;
                }
                Ok(())
            }
        }
    }

    fn edge(&self, id: EdgeId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::Edge;
        let m = self.model;
        let data = m.edge(id).map_err(|_| stale(K))?;
        let i = data.index;
        link(m.edge_use(data.edge_use), K, i)?;
        let Ok(cycle) = m.radial_cycle(data.edge_use) else {
            return Err(Defect::new(DefectKind::RadialOpen, K, i));
        };
        ensure(cycle.len() % 2 == 0, DefectKind::RadialOpen, K, i)?;
        for eu in cycle {
            ensure(link(m.edge_use(eu), K, i)?.edge == id, DefectKind::DefinitionMismatch, K, i)?;
        }
        Ok(())
    }

    fn edge_use(&self, id: EdgeUseId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::EdgeUse;
        let m = self.model;
        let data = m.edge_use(id).map_err(|_| stale(K))?;
        let i = data.index;
        let listed = match data.parent {
            EdgeUseParent::LoopUse(lu) => link(m.loop_use(lu), K, i)?.edge_uses().contains(&id),
            EdgeUseParent::Shell(s) => link(m.shell(s), K, i)?.edge_uses.contains(&id),
        };
        ensure(listed, DefectKind::ParentMismatch, K, i)?;
        link(m.edge(data.edge), K, i)?;

        let vu = link(m.vertex_use(data.vertex_use), K, i)?;
        ensure(vu.parent == VertexUseParent::EdgeUse(id), DefectKind::ParentMismatch, K, i)?;

        let mate = link(m.edge_use(data.mate), K, i)?;
        ensure(data.mate != id && mate.mate == id && mate.edge == data.edge, DefectKind::MateMismatch, K, i)?;
        let mates_agree = match (data.parent, mate.parent) {
            (EdgeUseParent::LoopUse(a), EdgeUseParent::LoopUse(b)) => link(m.loop_use(a), K, i)?.mate == b,
            (EdgeUseParent::Shell(a), EdgeUseParent::Shell(b)) => a == b,
            _ => false,
        };
        ensure(mates_agree, DefectKind::MateMismatch, K, i)?;

        let radial = link(m.edge_use(data.radial), K, i)?;
        ensure(radial.radial == id && radial.edge == data.edge, DefectKind::RadialMismatch, K, i)?;
        let end = link(m.eu_end(id), K, i)?;
        let radial_start = link(m.eu_start(data.radial), K, i)?;
        ensure(end == radial_start, DefectKind::RadialDirection, K, i)?;

        let here = link(m.eu_face_use(id), K, i)?;
        let there = link(m.eu_face_use(data.radial), K, i)?;
        if let (Some(a), Some(b)) = (here, there) {
            let a = link(m.face_use(a), K, i)?;
            let b = link(m.face_use(b), K, i)?;
            if a.shell == b.shell && a.face != b.face {
                ensure(a.orientation == b.orientation, DefectKind::RadialOrientation, K, i)?;
            }
        }
        Ok(())
    }

    fn vertex(&self, id: VertexId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::Vertex;
        let m = self.model;
        let data = m.vertex(id).map_err(|_| stale(K))?;
        ensure(!data.uses.is_empty(), DefectKind::UnusedVertex, K, data.index)?;
        for &vu in &data.uses {
            let vertex = link(m.vertex_use(vu), K, data.index)?.vertex;
            ensure(vertex == id, DefectKind::DefinitionMismatch, K, data.index)?;
        }
        Ok(())
    }

    fn vertex_use(&self, id: VertexUseId) -> Result<(), Defect> {
        const K: EntityKind = EntityKind::VertexUse;
        let m = self.model;
        let data = m.vertex_use(id).map_err(|_| stale(K))?;
        let i = data.index;
        ensure(link(m.vertex(data.vertex), K, i)?.uses.contains(&id), DefectKind::DefinitionMismatch, K, i)?;
        let back = match data.parent {
            VertexUseParent::EdgeUse(eu) => link(m.edge_use(eu), K, i)?.vertex_use == id,
            VertexUseParent::LoopUse(lu) => link(m.loop_use(lu), K, i)?.down == LoopDown::Vertex(id),
            VertexUseParent::Shell(s) => link(m.shell(s), K, i)?.vertex_use == Some(id),
        };
        ensure(back, DefectKind::ParentMismatch, K, i)
    }
}
