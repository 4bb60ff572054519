slotmap::new_key_type! {
    /// Unique identifier for a region in a model.
    pub struct RegionId;
}

slotmap::new_key_type! {
    /// Unique identifier for a shell in a model.
    pub struct ShellId;
}

slotmap::new_key_type! {
    /// Unique identifier for a face definition.
    pub struct FaceId;
}

slotmap::new_key_type! {
    /// Unique identifier for one oriented side of a face.
    pub struct FaceUseId;
}

slotmap::new_key_type! {
    /// Unique identifier for a loop definition.
    pub struct LoopId;
}

slotmap::new_key_type! {
    /// Unique identifier for one traversal of a loop.
    pub struct LoopUseId;
}

slotmap::new_key_type! {
    /// Unique identifier for an edge definition.
    pub struct EdgeId;
}

slotmap::new_key_type! {
    /// Unique identifier for one directed traversal of an edge.
    pub struct EdgeUseId;
}

slotmap::new_key_type! {
    /// Unique identifier for a vertex definition.
    pub struct VertexId;
}

slotmap::new_key_type! {
    /// Unique identifier for one appearance of a vertex.
    pub struct VertexUseId;
}
