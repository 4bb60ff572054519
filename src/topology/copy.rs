use std::collections::HashMap;
use std::hash::Hash;

use slotmap::{Key, SlotMap};

use crate::error::Result;

use super::{
    EdgeData, EdgeId, EdgeUseData, EdgeUseId, EdgeUseParent, FaceData, FaceId, FaceUseData,
    FaceUseId, LoopData, LoopDown, LoopId, LoopParent, LoopUseData, LoopUseId, Model, RegionData,
    RegionId, ShellData, ShellId, VertexData, VertexId, VertexUseData, VertexUseId,
    VertexUseParent,
};

trait Indexed {
    fn index(&self) -> u64;
    fn set_index(&mut self, index: u64);
}

macro_rules! impl_indexed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Indexed for $ty {
                fn index(&self) -> u64 {
                    self.index
                }
                fn set_index(&mut self, index: u64) {
                    self.index = index;
                }
            }
        )*
    };
}

impl_indexed!(
    RegionData,
    ShellData,
    FaceData,
    FaceUseData,
    LoopData,
    LoopUseData,
    EdgeData,
    EdgeUseData,
    VertexData,
    VertexUseData,
);

/// Entities lifted out of a model (or a copy of part of one), waiting to be
/// installed under fresh keys and indices.
#[derive(Default)]
struct Payload {
    regions: Vec<(RegionId, RegionData)>,
    shells: Vec<(ShellId, ShellData)>,
    faces: Vec<(FaceId, FaceData)>,
    face_uses: Vec<(FaceUseId, FaceUseData)>,
    loops: Vec<(LoopId, LoopData)>,
    loop_uses: Vec<(LoopUseId, LoopUseData)>,
    edges: Vec<(EdgeId, EdgeData)>,
    edge_uses: Vec<(EdgeUseId, EdgeUseData)>,
    vertices: Vec<(VertexId, VertexData)>,
    vertex_uses: Vec<(VertexUseId, VertexUseData)>,
}

/// Old key to new key, per kind.
#[derive(Default)]
struct KeyMap {
    regions: HashMap<RegionId, RegionId>,
    shells: HashMap<ShellId, ShellId>,
    faces: HashMap<FaceId, FaceId>,
    face_uses: HashMap<FaceUseId, FaceUseId>,
    loops: HashMap<LoopId, LoopId>,
    loop_uses: HashMap<LoopUseId, LoopUseId>,
    edges: HashMap<EdgeId, EdgeId>,
    edge_uses: HashMap<EdgeUseId, EdgeUseId>,
    vertices: HashMap<VertexId, VertexId>,
    vertex_uses: HashMap<VertexUseId, VertexUseId>,
}

fn mapped<K: Copy + Eq + Hash>(map: &HashMap<K, K>, k: K) -> K {
    map.get(&k).copied().unwrap_or(k)
}

fn mapped_all<K: Copy + Eq + Hash>(map: &HashMap<K, K>, keys: &mut Vec<K>) {
    for k in keys.iter_mut() {
        *k = mapped(map, *k);
    }
}

/// Inserts `items` in their original index order, numbering them from `next`.
fn transfer<K: Key + Hash, V: Indexed>(
    mut items: Vec<(K, V)>,
    dst: &mut SlotMap<K, V>,
    map: &mut HashMap<K, K>,
    next: &mut u64,
) {
    items.sort_by_key(|(_, v)| v.index());
    for (old, mut value) in items {
        value.set_index(*next);
        *next += 1;
        map.insert(old, dst.insert(value));
    }
}

fn cloned<K: Key, V: Clone>(arena: &SlotMap<K, V>, keys: impl IntoIterator<Item = K>) -> Vec<(K, V)> {
    keys.into_iter()
        .filter_map(|k| arena.get(k).map(|v| (k, v.clone())))
        .collect()
}

impl Model {
    /// Deep-copies a shell into a new shell of the same region.
    ///
    /// Vertices, edges and faces are duplicated; plane and line geometry is
    /// shared with the original. Edges of the copy are used only by the copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is stale or its structure is broken.
    pub fn dup_shell(&mut self, s: ShellId) -> Result<ShellId> {
        let data = self.shell(s)?.clone();
        let copy = self.make_shell(data.region)?;

        let mut face_uses = data.face_uses.clone();
        face_uses.sort_unstable();
        face_uses.dedup();
        let faces: Vec<FaceId> = self.shell_faces(s)?;
        let mut loop_uses = data.loop_uses.clone();
        for &fu in &face_uses {
            loop_uses.extend_from_slice(&self.face_use(fu)?.loop_uses);
        }
        let mut loops = loop_uses
            .iter()
            .map(|&lu| -> Result<LoopId> { Ok(self.loop_use(lu)?.lp) })
            .collect::<Result<Vec<_>>>()?;
        loops.sort_unstable();
        loops.dedup();
        let edge_uses = self.shell_edge_uses(s)?;
        let edges = self.shell_edges(s)?;
        let mut vertex_uses = Vec::new();
        for &eu in &edge_uses {
            vertex_uses.push(self.edge_use(eu)?.vertex_use);
        }
        for &lu in &loop_uses {
            if let LoopDown::Vertex(vu) = self.loop_use(lu)?.down {
                vertex_uses.push(vu);
            }
        }
        vertex_uses.extend(data.vertex_use);
        let vertices = self.shell_vertices(s)?;

        let payload = Payload {
            faces: cloned(&self.faces, faces),
            face_uses: cloned(&self.face_uses, face_uses),
            loops: cloned(&self.loops, loops),
            loop_uses: cloned(&self.loop_uses, loop_uses),
            edges: cloned(&self.edges, edges),
            edge_uses: cloned(&self.edge_uses, edge_uses),
            vertices: cloned(&self.vertices, vertices),
            vertex_uses: cloned(&self.vertex_uses, vertex_uses),
            ..Payload::default()
        };
        let mut keys = KeyMap::default();
        keys.shells.insert(s, copy);
        self.install(payload, &mut keys)?;

        let target = self.shell_mut(copy)?;
        target.face_uses = data.face_uses.iter().map(|&x| mapped(&keys.face_uses, x)).collect();
        target.loop_uses = data.loop_uses.iter().map(|&x| mapped(&keys.loop_uses, x)).collect();
        target.edge_uses = data.edge_uses.iter().map(|&x| mapped(&keys.edge_uses, x)).collect();
        target.vertex_use = data.vertex_use.map(|x| mapped(&keys.vertex_uses, x));
        Ok(copy)
    }

    /// Moves every region of `other` into this model, giving each entity a
    /// fresh index here. Returns the new handles of the moved regions, in
    /// their original order.
    ///
    /// Models built independently (for example on separate threads) can be
    /// combined this way before a boolean operation.
    ///
    /// # Errors
    ///
    /// Returns an error if `other` is structurally broken.
    pub fn merge_models(&mut self, other: Model) -> Result<Vec<RegionId>> {
        let order = other.region_order.clone();
        let payload = Payload {
            regions: other.regions.into_iter().collect(),
            shells: other.shells.into_iter().collect(),
            faces: other.faces.into_iter().collect(),
            face_uses: other.face_uses.into_iter().collect(),
            loops: other.loops.into_iter().collect(),
            loop_uses: other.loop_uses.into_iter().collect(),
            edges: other.edges.into_iter().collect(),
            edge_uses: other.edge_uses.into_iter().collect(),
            vertices: other.vertices.into_iter().collect(),
            vertex_uses: other.vertex_uses.into_iter().collect(),
        };
        let mut keys = KeyMap::default();
        self.install(payload, &mut keys)?;
        let regions: Vec<RegionId> = order.into_iter().map(|r| mapped(&keys.regions, r)).collect();
        self.region_order.extend_from_slice(&regions);
        Ok(regions)
    }

    /// Inserts a payload under fresh keys, then rewrites every link of the
    /// inserted entities through `keys`. Edges are re-linked radially over
    /// the inserted uses only.
    fn install(&mut self, payload: Payload, keys: &mut KeyMap) -> Result<()> {
        let mut next = self.max_index;
        transfer(payload.regions, &mut self.regions, &mut keys.regions, &mut next);
        transfer(payload.shells, &mut self.shells, &mut keys.shells, &mut next);
        transfer(payload.faces, &mut self.faces, &mut keys.faces, &mut next);
        transfer(payload.face_uses, &mut self.face_uses, &mut keys.face_uses, &mut next);
        transfer(payload.loops, &mut self.loops, &mut keys.loops, &mut next);
        transfer(payload.loop_uses, &mut self.loop_uses, &mut keys.loop_uses, &mut next);
        transfer(payload.edges, &mut self.edges, &mut keys.edges, &mut next);
        transfer(payload.edge_uses, &mut self.edge_uses, &mut keys.edge_uses, &mut next);
        transfer(payload.vertices, &mut self.vertices, &mut keys.vertices, &mut next);
        transfer(payload.vertex_uses, &mut self.vertex_uses, &mut keys.vertex_uses, &mut next);
        self.max_index = next;

        for &r in keys.regions.values() {
            let data = self.region_mut(r)?;
            mapped_all(&keys.shells, &mut data.shells);
        }
        for &s in keys.shells.values() {
            let data = self.shell_mut(s)?;
            data.region = mapped(&keys.regions, data.region);
            mapped_all(&keys.face_uses, &mut data.face_uses);
            mapped_all(&keys.loop_uses, &mut data.loop_uses);
            mapped_all(&keys.edge_uses, &mut data.edge_uses);
            data.vertex_use = data.vertex_use.map(|x| mapped(&keys.vertex_uses, x));
        }
        for &f in keys.faces.values() {
            let data = self.face_mut(f)?;
            data.face_use = mapped(&keys.face_uses, data.face_use);
        }
        for &fu in keys.face_uses.values() {
            let data = self.face_use_mut(fu)?;
            data.shell = mapped(&keys.shells, data.shell);
            data.mate = mapped(&keys.face_uses, data.mate);
            data.face = mapped(&keys.faces, data.face);
            mapped_all(&keys.loop_uses, &mut data.loop_uses);
        }
        for &l in keys.loops.values() {
            let data = self.loop_def_mut(l)?;
            data.loop_use = mapped(&keys.loop_uses, data.loop_use);
        }
        for &lu in keys.loop_uses.values() {
            let data = self.loop_use_mut(lu)?;
            data.parent = match data.parent {
                LoopParent::FaceUse(fu) => LoopParent::FaceUse(mapped(&keys.face_uses, fu)),
                LoopParent::Shell(s) => LoopParent::Shell(mapped(&keys.shells, s)),
            };
            data.mate = mapped(&keys.loop_uses, data.mate);
            data.lp = mapped(&keys.loops, data.lp);
            match &mut data.down {
                LoopDown::Edges(eus) => mapped_all(&keys.edge_uses, eus),
                LoopDown::Vertex(vu) => *vu = mapped(&keys.vertex_uses, *vu),
            }
        }
        let mut around: HashMap<EdgeId, Vec<EdgeUseId>> = HashMap::new();
        for &eu in keys.edge_uses.values() {
            let data = self.edge_use_mut(eu)?;
            data.parent = match data.parent {
                EdgeUseParent::LoopUse(lu) => EdgeUseParent::LoopUse(mapped(&keys.loop_uses, lu)),
                EdgeUseParent::Shell(s) => EdgeUseParent::Shell(mapped(&keys.shells, s)),
            };
            data.mate = mapped(&keys.edge_uses, data.mate);
            data.radial = mapped(&keys.edge_uses, data.radial);
            data.edge = mapped(&keys.edges, data.edge);
            data.vertex_use = mapped(&keys.vertex_uses, data.vertex_use);
            around.entry(data.edge).or_default().push(eu);
        }
        for &v in keys.vertices.values() {
            let data = self.vertex_mut(v)?;
            data.uses = data
                .uses
                .iter()
                .filter_map(|vu| keys.vertex_uses.get(vu).copied())
                .collect();
        }
        for &vu in keys.vertex_uses.values() {
            let data = self.vertex_use_mut(vu)?;
            data.vertex = mapped(&keys.vertices, data.vertex);
            data.parent = match data.parent {
                VertexUseParent::EdgeUse(eu) => VertexUseParent::EdgeUse(mapped(&keys.edge_uses, eu)),
                VertexUseParent::LoopUse(lu) => VertexUseParent::LoopUse(mapped(&keys.loop_uses, lu)),
                VertexUseParent::Shell(s) => VertexUseParent::Shell(mapped(&keys.shells, s)),
            };
        }

        let mut edges: Vec<EdgeId> = keys.edges.values().copied().collect();
        edges.sort_by_key(|&e| self.edges.get(e).map_or(0, |d| d.index));
        for e in edges {
            let mut uses = around.remove(&e).unwrap_or_default();
            uses.sort_by_key(|&eu| self.edge_uses.get(eu).map_or(0, |d| d.index));
            if uses.is_empty() {
                self.edges.remove(e);
            } else {
                self.relink_radial_uses(e, &uses)?;
            }
        }
        Ok(())
    }
}
