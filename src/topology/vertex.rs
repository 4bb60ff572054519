use crate::math::Point3;

use super::keys::{EdgeUseId, LoopUseId, ShellId, VertexId, VertexUseId};

/// A point in space and every use that refers to it.
#[derive(Debug, Clone)]
pub struct VertexData {
    pub index: u64,
    pub point: Point3,
    pub uses: Vec<VertexUseId>,
}

/// Owner of a vertex-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexUseParent {
    /// Start of an edge-use.
    EdgeUse(EdgeUseId),
    /// The single vertex of a vertex loop.
    LoopUse(LoopUseId),
    /// A lone vertex in a shell.
    Shell(ShellId),
}

/// One appearance of a vertex.
#[derive(Debug, Clone)]
pub struct VertexUseData {
    pub index: u64,
    pub parent: VertexUseParent,
    pub vertex: VertexId,
}
