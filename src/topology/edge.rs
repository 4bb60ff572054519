use std::sync::Arc;

use crate::geometry::Line;

use super::keys::{EdgeId, EdgeUseId, LoopUseId, ShellId, VertexUseId};

/// Shared curve geometry of an edge.
///
/// The number of live references to `line` is the usage count of the
/// geometry; pieces of a split edge share it.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub index: u64,
    pub edge_use: EdgeUseId,
    pub line: Arc<Line>,
}

/// Owner of an edge-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeUseParent {
    LoopUse(LoopUseId),
    /// Wire edge.
    Shell(ShellId),
}

/// One directed traversal of an edge.
///
/// The edge-use starts at its vertex-use and ends where its mate starts.
/// `radial` is the next edge-use around the edge, on the adjacent face; radial
/// partners run in opposite directions.
#[derive(Debug, Clone)]
pub struct EdgeUseData {
    pub index: u64,
    pub parent: EdgeUseParent,
    pub mate: EdgeUseId,
    pub radial: EdgeUseId,
    pub edge: EdgeId,
    pub vertex_use: VertexUseId,
}
