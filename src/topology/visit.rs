use crate::error::TopologyError;

use super::{EntityKind, EntityRef, LoopDown, Model};

/// Callbacks for a depth-first walk over the model.
///
/// Every use is entered once, on the way down from its parent. A shared
/// definition (face, loop, edge, vertex) is entered once, from the first use
/// that reaches it.
pub trait Visitor {
    fn enter(&mut self, model: &Model, entity: EntityRef) {
        let _ = (model, entity);
    }

    fn leave(&mut self, model: &Model, entity: EntityRef) {
        let _ = (model, entity);
    }
}

/// Number of entities of each kind reached from a root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructCounts {
    pub regions: usize,
    pub shells: usize,
    pub faces: usize,
    pub face_uses: usize,
    pub loops: usize,
    pub loop_uses: usize,
    pub edges: usize,
    pub edge_uses: usize,
    pub vertices: usize,
    pub vertex_uses: usize,
}

impl StructCounts {
    /// Counts everything reachable from the model's regions.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if a link on the way is stale.
    pub fn of_model(model: &Model) -> Result<Self, TopologyError> {
        let mut counts = Self::default();
        model.walk_model(&mut counts)?;
        Ok(counts)
    }

    /// Counts everything reachable from `root`.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if a link on the way is stale.
    pub fn of(model: &Model, root: EntityRef) -> Result<Self, TopologyError> {
        let mut counts = Self::default();
        model.walk(root, &mut counts)?;
        Ok(counts)
    }

    /// Sizes of the model's arenas, reachable or not.
    #[must_use]
    pub fn stored(model: &Model) -> Self {
        Self {
            regions: model.regions.len(),
            shells: model.shells.len(),
            faces: model.faces.len(),
            face_uses: model.face_uses.len(),
            loops: model.loops.len(),
            loop_uses: model.loop_uses.len(),
            edges: model.edges.len(),
            edge_uses: model.edge_uses.len(),
            vertices: model.vertices.len(),
            vertex_uses: model.vertex_uses.len(),
        }
    }
}

impl Visitor for StructCounts {
    fn enter(&mut self, _model: &Model, entity: EntityRef) {
        let slot = match entity.kind() {
            EntityKind::Region => &mut self.regions,
            EntityKind::Shell => &mut self.shells,
            EntityKind::Face => &mut self.faces,
            EntityKind::FaceUse => &mut self.face_uses,
            EntityKind::Loop => &mut self.loops,
            EntityKind::LoopUse => &mut self.loop_uses,
            EntityKind::Edge => &mut self.edges,
            EntityKind::EdgeUse => &mut self.edge_uses,
            EntityKind::Vertex => &mut self.vertices,
            EntityKind::VertexUse => &mut self.vertex_uses,
            EntityKind::Model => return,
        };
        *slot += 1;
    }
}

impl Model {
    /// Walks every region of the model depth-first.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if a link on the way is stale.
    pub fn walk_model(&self, visitor: &mut impl Visitor) -> Result<(), TopologyError> {
        let mut seen = vec![false; usize::try_from(self.max_index).unwrap_or(0)];
        for &r in &self.region_order {
            self.walk_from(r.into(), visitor, &mut seen)?;
        }
        Ok(())
    }

    /// Walks the entities below `root` depth-first, `root` included.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if a link on the way is stale.
    pub fn walk(&self, root: EntityRef, visitor: &mut impl Visitor) -> Result<(), TopologyError> {
        let mut seen = vec![false; usize::try_from(self.max_index).unwrap_or(0)];
        self.walk_from(root, visitor, &mut seen)
    }

    fn walk_from(
        &self,
        entity: EntityRef,
        visitor: &mut impl Visitor,
        seen: &mut [bool],
    ) -> Result<(), TopologyError> {
        // Definitions are reached from each of their uses; enter them once.
        if !entity.is_use() && !matches!(entity, EntityRef::Region(_) | EntityRef::Shell(_)) {
            let index = usize::try_from(self.index_of(entity)?).unwrap_or(usize::MAX);
            match seen.get_mut(index) {
                Some(flag) if *flag => return Ok(()),
                Some(flag) => *flag = true,
                None => {}
            }
        }

        visitor.enter(self, entity);
        let children: Vec<EntityRef> = match entity {
            EntityRef::Region(id) => self.region(id)?.shells.iter().map(|&s| s.into()).collect(),
            EntityRef::Shell(id) => {
                let data = self.shell(id)?;
                let mut out: Vec<EntityRef> = Vec::new();
                out.extend(data.face_uses.iter().map(|&x| EntityRef::from(x)));
                out.extend(data.loop_uses.iter().map(|&x| EntityRef::from(x)));
                out.extend(data.edge_uses.iter().map(|&x| EntityRef::from(x)));
                out.extend(data.vertex_use.map(EntityRef::from));
                out
            }
            EntityRef::FaceUse(id) => {
                let data = self.face_use(id)?;
                let mut out = vec![EntityRef::from(data.face)];
                out.extend(data.loop_uses.iter().map(|&x| EntityRef::from(x)));
                out
            }
            EntityRef::LoopUse(id) => {
                let data = self.loop_use(id)?;
                let mut out = vec![EntityRef::from(data.lp)];
                match &data.down {
                    LoopDown::Edges(eus) => out.extend(eus.iter().map(|&x| EntityRef::from(x))),
                    LoopDown::Vertex(vu) => out.push((*vu).into()),
                }
                out
            }
            EntityRef::EdgeUse(id) => {
                let data = self.edge_use(id)?;
                vec![data.edge.into(), data.vertex_use.into()]
            }
            EntityRef::VertexUse(id) => vec![self.vertex_use(id)?.vertex.into()],
            EntityRef::Face(_) | EntityRef::Loop(_) | EntityRef::Edge(_) | EntityRef::Vertex(_) => {
                if !self.contains(entity) {
                    return Err(TopologyError::not_found(entity.kind()));
                }
                Vec::new()
            }
        };
        for child in children {
            self.walk_from(child, visitor, seen)?;
        }
        visitor.leave(self, entity);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use crate::topology::ShellId;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_box(model: &mut Model) -> ShellId {
        let r = model.make_region();
        MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(model, r)
            .unwrap()
    }

    #[test]
    fn box_counts() {
        let mut model = Model::new();
        let s = unit_box(&mut model);
        let counts = StructCounts::of_model(&model).unwrap();
        assert_eq!(
            counts,
            StructCounts {
                regions: 1,
                shells: 1,
                faces: 6,
                face_uses: 12,
                loops: 6,
                loop_uses: 12,
                edges: 12,
                edge_uses: 48,
                vertices: 8,
                vertex_uses: 48,
            }
        );
        assert_eq!(counts, StructCounts::stored(&model));

        let below = StructCounts::of(&model, s.into()).unwrap();
        assert_eq!(below.regions, 0);
        assert_eq!(below.shells, 1);
        assert_eq!(below.edges, 12);
    }

    #[derive(Default)]
    struct Depth {
        current: usize,
        deepest: usize,
        entered: usize,
        left: usize,
    }

    impl Visitor for Depth {
        fn enter(&mut self, _model: &Model, _entity: EntityRef) {
            self.current += 1;
            self.deepest = self.deepest.max(self.current);
            self.entered += 1;
        }

        fn leave(&mut self, _model: &Model, _entity: EntityRef) {
            self.current -= 1;
            self.left += 1;
        }
    }

    #[test]
    fn walk_enters_and_leaves_in_pairs() {
        let mut model = Model::new();
        unit_box(&mut model);
        let mut depth = Depth::default();
        model.walk_model(&mut depth).unwrap();

        assert_eq!(depth.current, 0);
        assert_eq!(depth.entered, depth.left);
        // region, shell, face-use, loop-use, edge-use, vertex-use, vertex
        assert_eq!(depth.deepest, 7);
    }

    #[test]
    fn walk_from_a_stale_root_fails() {
        let mut model = Model::new();
        let s = unit_box(&mut model);
        model.kill_shell(s).unwrap();
        assert!(StructCounts::of(&model, s.into()).is_err());
    }
}
