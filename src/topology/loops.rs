use crate::math::Aabb;

use super::entity::Orientation;
use super::keys::{EdgeUseId, FaceUseId, LoopId, LoopUseId, ShellId, VertexUseId};

/// Shared loop definition.
#[derive(Debug, Clone)]
pub struct LoopData {
    pub index: u64,
    pub loop_use: LoopUseId,
    pub bbox: Aabb,
}

/// Owner of a loop-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopParent {
    FaceUse(FaceUseId),
    /// Wire loop.
    Shell(ShellId),
}

/// What a loop-use is made of: a non-empty cycle of edge-uses, or a single
/// vertex-use. Never empty and never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopDown {
    Edges(Vec<EdgeUseId>),
    Vertex(VertexUseId),
}

/// One traversal of a loop.
#[derive(Debug, Clone)]
pub struct LoopUseData {
    pub index: u64,
    pub parent: LoopParent,
    pub mate: LoopUseId,
    pub orientation: Orientation,
    pub lp: LoopId,
    pub down: LoopDown,
}

impl LoopUseData {
    /// Edge-uses in traversal order; empty for a vertex loop.
    #[must_use]
    pub fn edge_uses(&self) -> &[EdgeUseId] {
        match &self.down {
            LoopDown::Edges(eus) => eus,
            LoopDown::Vertex(_) => &[],
        }
    }
}
