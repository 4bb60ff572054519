use super::keys::{EdgeUseId, FaceUseId, LoopUseId, RegionId, VertexUseId};

/// A boundary component: closed, open, or a bag of wires and points.
///
/// Faces appear through both of their uses; wire edges through both the
/// edge-use and its mate.
#[derive(Debug, Clone)]
pub struct ShellData {
    pub index: u64,
    pub region: RegionId,
    pub face_uses: Vec<FaceUseId>,
    /// Wire loops, not attached to any face.
    pub loop_uses: Vec<LoopUseId>,
    /// Wire edges, not attached to any loop.
    pub edge_uses: Vec<EdgeUseId>,
    /// A lone vertex; only present when the shell has nothing else.
    pub vertex_use: Option<VertexUseId>,
}

impl ShellData {
    /// Returns `true` if the shell owns nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.face_uses.is_empty()
            && self.loop_uses.is_empty()
            && self.edge_uses.is_empty()
            && self.vertex_use.is_none()
    }
}
