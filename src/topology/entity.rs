use std::fmt;

use super::keys::{
    EdgeId, EdgeUseId, FaceId, FaceUseId, LoopId, LoopUseId, RegionId, ShellId, VertexId,
    VertexUseId,
};

/// The concrete kind of a topological entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Model,
    Region,
    Shell,
    Face,
    FaceUse,
    Loop,
    LoopUse,
    Edge,
    EdgeUse,
    Vertex,
    VertexUse,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Model => "model",
            Self::Region => "region",
            Self::Shell => "shell",
            Self::Face => "face",
            Self::FaceUse => "face-use",
            Self::Loop => "loop",
            Self::LoopUse => "loop-use",
            Self::Edge => "edge",
            Self::EdgeUse => "edge-use",
            Self::Vertex => "vertex",
            Self::VertexUse => "vertex-use",
        };
        f.write_str(name)
    }
}

/// A handle to any entity below the model.
///
/// Generic routines (the visitor, the auditor, `destroy`) match on this
/// instead of inspecting a runtime tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Region(RegionId),
    Shell(ShellId),
    Face(FaceId),
    FaceUse(FaceUseId),
    Loop(LoopId),
    LoopUse(LoopUseId),
    Edge(EdgeId),
    EdgeUse(EdgeUseId),
    Vertex(VertexId),
    VertexUse(VertexUseId),
}

impl EntityRef {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Region(_) => EntityKind::Region,
            Self::Shell(_) => EntityKind::Shell,
            Self::Face(_) => EntityKind::Face,
            Self::FaceUse(_) => EntityKind::FaceUse,
            Self::Loop(_) => EntityKind::Loop,
            Self::LoopUse(_) => EntityKind::LoopUse,
            Self::Edge(_) => EntityKind::Edge,
            Self::EdgeUse(_) => EntityKind::EdgeUse,
            Self::Vertex(_) => EntityKind::Vertex,
            Self::VertexUse(_) => EntityKind::VertexUse,
        }
    }

    /// Returns `true` for the directed "use" kinds, which always come in mate pairs
    /// (vertex-uses excepted).
    #[must_use]
    pub fn is_use(&self) -> bool {
        matches!(
            self,
            Self::FaceUse(_) | Self::LoopUse(_) | Self::EdgeUse(_) | Self::VertexUse(_)
        )
    }
}

macro_rules! impl_from_key {
    ($($key:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$key> for EntityRef {
                fn from(id: $key) -> Self {
                    Self::$variant(id)
                }
            }
        )*
    };
}

impl_from_key! {
    RegionId => Region,
    ShellId => Shell,
    FaceId => Face,
    FaceUseId => FaceUse,
    LoopId => Loop,
    LoopUseId => LoopUse,
    EdgeId => Edge,
    EdgeUseId => EdgeUse,
    VertexId => Vertex,
    VertexUseId => VertexUse,
}

/// Orientation of a face-use or loop-use.
///
/// For face-uses, `Same` means the use's normal agrees with the face geometry
/// (before the face flip flag is applied) and its mate is `Opposite`. For
/// loop-uses the value is shared by both mates: `Same` marks an outer boundary,
/// `Opposite` a hole, and `Unspecified` a wire loop with no face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Same,
    Opposite,
    Unspecified,
}

impl Orientation {
    /// `Same` and `Opposite` swap; `Unspecified` stays.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Same => Self::Opposite,
            Self::Opposite => Self::Same,
            Self::Unspecified => Self::Unspecified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_is_an_involution() {
        for o in [Orientation::Same, Orientation::Opposite, Orientation::Unspecified] {
            assert_eq!(o.reversed().reversed(), o);
        }
        assert_eq!(Orientation::Same.reversed(), Orientation::Opposite);
    }

    #[test]
    fn kinds_display_with_hyphenated_use_names() {
        assert_eq!(EntityKind::EdgeUse.to_string(), "edge-use");
        assert_eq!(EntityRef::from(VertexId::default()).kind(), EntityKind::Vertex);
    }
}
