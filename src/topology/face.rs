use std::sync::Arc;

use crate::geometry::Plane;
use crate::math::Aabb;

use super::entity::Orientation;
use super::keys::{FaceId, FaceUseId, LoopUseId, ShellId};

/// Shared surface geometry of a face.
///
/// The plane is reference counted: faces produced by cutting another face
/// share its plane. `flip` reverses the plane normal for this face only.
#[derive(Debug, Clone)]
pub struct FaceData {
    pub index: u64,
    /// One of the two uses, always the one that was `Same` at creation.
    pub face_use: FaceUseId,
    pub plane: Arc<Plane>,
    pub flip: bool,
    pub bbox: Aabb,
}

/// One oriented side of a face.
#[derive(Debug, Clone)]
pub struct FaceUseData {
    pub index: u64,
    pub shell: ShellId,
    pub mate: FaceUseId,
    pub orientation: Orientation,
    pub face: FaceId,
    /// Outer boundary first, holes after.
    pub loop_uses: Vec<LoopUseId>,
}
