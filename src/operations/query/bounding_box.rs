use crate::error::Result;
use crate::math::Aabb;
use crate::topology::{EntityRef, Model};

/// Computes the axis-aligned bounding box of any entity.
///
/// Regions, shells, faces and loops report the boxes the model keeps up to
/// date; the remaining kinds are boxed from their vertices.
pub struct BoundingBox {
    entity: EntityRef,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(entity: impl Into<EntityRef>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    /// Executes the query, returning the AABB. Empty entities give an empty box.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity or a link below it is stale.
    pub fn execute(&self, model: &Model) -> Result<Aabb> {
        let bbox = match self.entity {
            EntityRef::Region(r) => model.region_bbox(r)?,
            EntityRef::Shell(s) => model.shell_bbox(s)?,
            EntityRef::Face(f) => model.face_bbox(f)?,
            EntityRef::FaceUse(fu) => model.face_bbox(model.face_use(fu)?.face)?,
            EntityRef::Loop(l) => model.loop_def(l)?.bbox,
            EntityRef::LoopUse(lu) => model.loop_bbox(lu)?,
            EntityRef::Edge(e) => {
                let (a, b) = model.edge_vertices(e)?;
                Aabb::from_points([&model.vertex(a)?.point, &model.vertex(b)?.point])
            }
            EntityRef::EdgeUse(eu) => {
                let (a, b) = model.eu_points(eu)?;
                Aabb::from_points([&a, &b])
            }
            EntityRef::Vertex(v) => Aabb::from_points([&model.vertex(v)?.point]),
            EntityRef::VertexUse(vu) => {
                Aabb::from_points([&model.vertex(model.vertex_use(vu)?.vertex)?.point])
            }
        };
        Ok(bbox)
    }
}
