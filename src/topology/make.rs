use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{GeometryError, NmgError, Result, TopologyError};
use crate::geometry::{Line, Plane};
use crate::math::{Aabb, Point3};

use super::{
    EdgeData, EdgeId, EdgeUseData, EdgeUseId, EdgeUseParent, FaceData, FaceId, FaceUseData, FaceUseId,
    LoopData, LoopDown, LoopParent, LoopUseData, LoopUseId, Model, Orientation, RegionData,
    RegionId, ShellData, ShellId, VertexData, VertexId, VertexUseData, VertexUseId,
    VertexUseParent,
};

/// A loop corner: an existing vertex, or a point where a new vertex is made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Corner {
    Vertex(VertexId),
    Point(Point3),
}

impl From<VertexId> for Corner {
    fn from(v: VertexId) -> Self {
        Self::Vertex(v)
    }
}

impl From<Point3> for Corner {
    fn from(p: Point3) -> Self {
        Self::Point(p)
    }
}

impl Model {
    /// Creates an empty region.
    pub fn make_region(&mut self) -> RegionId {
        let index = self.alloc_index();
        let r = self.regions.insert(RegionData {
            index,
            shells: Vec::new(),
        });
        self.region_order.push(r);
        r
    }

    /// Creates an empty shell in `region`.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the region is stale.
    pub fn make_shell(&mut self, region: RegionId) -> Result<ShellId> {
        self.region(region)?;
        let index = self.alloc_index();
        let s = self.shells.insert(ShellData {
            index,
            region,
            face_uses: Vec::new(),
            loop_uses: Vec::new(),
            edge_uses: Vec::new(),
            vertex_use: None,
        });
        self.region_mut(region)?.shells.push(s);
        Ok(s)
    }

    /// Places a lone vertex in an empty shell.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTopology` if the shell already owns something.
    pub fn make_shell_vertex(&mut self, shell: ShellId, at: Corner) -> Result<VertexUseId> {
        if !self.shell(shell)?.is_empty() {
            return Err(TopologyError::InvalidTopology(
                "a lone vertex needs an empty shell".into(),
            )
            .into());
        }
        self.check_corners(&[at])?;
        let v = self.resolve_corner(at);
        let vu = self.new_vertex_use(v, VertexUseParent::Shell(shell))?;
        self.shell_mut(shell)?.vertex_use = Some(vu);
        Ok(vu)
    }

    /// Creates a wire edge from `a` to `b` directly in a shell.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` if both ends are the same point, or
    /// `EntityNotFound` for stale handles.
    pub fn make_wire_edge(&mut self, shell: ShellId, a: Corner, b: Corner) -> Result<EdgeUseId> {
        self.shell(shell)?;
        self.check_corners(&[a, b])?;
        let va = self.resolve_corner(a);
        let vb = self.resolve_corner(b);
        let parent = EdgeUseParent::Shell(shell);
        let (eu, eum) = self.new_edge_pair(parent, parent, va, vb)?;
        let data = self.shell_mut(shell)?;
        data.edge_uses.push(eu);
        data.edge_uses.push(eum);
        self.drop_lone_vertex(shell)?;
        Ok(eu)
    }

    /// Creates a closed wire loop through `corners`.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` if the loop has fewer than three corners or repeats
    /// a corner, or `EntityNotFound` for stale handles.
    pub fn make_wire_loop(&mut self, shell: ShellId, corners: &[Corner]) -> Result<LoopUseId> {
        self.shell(shell)?;
        if corners.len() < 3 {
            return Err(GeometryError::degenerate("a wire loop needs at least three corners").into());
        }
        self.check_corners(corners)?;
        let parent = LoopParent::Shell(shell);
        let lu = self.new_loop_pair(parent, parent, corners, Orientation::Unspecified)?;
        let mate = self.loop_use(lu)?.mate;
        let data = self.shell_mut(shell)?;
        data.loop_uses.push(lu);
        data.loop_uses.push(mate);
        self.drop_lone_vertex(shell)?;
        Ok(lu)
    }

    /// Creates a wire loop made of a single vertex.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for stale handles.
    pub fn make_loop_vertex(&mut self, shell: ShellId, at: Corner) -> Result<LoopUseId> {
        self.shell(shell)?;
        self.check_corners(&[at])?;
        let parent = LoopParent::Shell(shell);
        let lu = self.new_loop_pair(parent, parent, &[at], Orientation::Unspecified)?;
        let mate = self.loop_use(lu)?.mate;
        let data = self.shell_mut(shell)?;
        data.loop_uses.push(lu);
        data.loop_uses.push(mate);
        self.drop_lone_vertex(shell)?;
        Ok(lu)
    }

    /// Creates a face with both of its uses in `shell`.
    ///
    /// The first loop is the outer boundary, the rest are holes. Corners must
    /// already be wound for the `Same` use: outer loops counter-clockwise
    /// about the face normal, holes clockwise. A loop of one corner becomes a
    /// vertex loop. Returns the `Same` face-use.
    ///
    /// Fresh edges are not shared with neighbouring faces; use
    /// [`Model::glue_faces`] to join coincident edges radially.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` if a loop has two corners, repeats a vertex, or has
    /// coincident consecutive points; `EntityNotFound` for stale handles.
    pub fn make_face(
        &mut self,
        shell: ShellId,
        plane: Arc<Plane>,
        flip: bool,
        loops: &[Vec<Corner>],
    ) -> Result<FaceUseId> {
        self.shell(shell)?;
        if loops.is_empty() {
            return Err(GeometryError::degenerate("a face needs at least one loop").into());
        }
        for corners in loops {
            if corners.len() == 2 || corners.is_empty() {
                return Err(GeometryError::degenerate(format!(
                    "a face loop cannot have {} corners",
                    corners.len()
                ))
                .into());
            }
            self.check_corners(corners)?;
        }

        let face_index = self.alloc_index();
        let fu_index = self.alloc_index();
        let fum_index = self.alloc_index();
        let fu = self.face_uses.insert(FaceUseData {
            index: fu_index,
            shell,
            mate: FaceUseId::default(),
            orientation: Orientation::Same,
            face: FaceId::default(),
            loop_uses: Vec::new(),
        });
        let fum = self.face_uses.insert(FaceUseData {
            index: fum_index,
            shell,
            mate: fu,
            orientation: Orientation::Opposite,
            face: FaceId::default(),
            loop_uses: Vec::new(),
        });
        let face = self.faces.insert(FaceData {
            index: face_index,
            face_use: fu,
            plane,
            flip,
            bbox: Aabb::empty(),
        });
        {
            let data = self.face_use_mut(fu)?;
            data.mate = fum;
            data.face = face;
        }
        self.face_use_mut(fum)?.face = face;

        let mut bbox = Aabb::empty();
        for (i, corners) in loops.iter().enumerate() {
            let orientation = if i == 0 {
                Orientation::Same
            } else {
                Orientation::Opposite
            };
            let lu = self.new_loop_pair(
                LoopParent::FaceUse(fu),
                LoopParent::FaceUse(fum),
                corners,
                orientation,
            )?;
            let lum = self.loop_use(lu)?.mate;
            bbox = bbox.union(&self.loop_bbox(lu)?);
            self.face_use_mut(fu)?.loop_uses.push(lu);
            self.face_use_mut(fum)?.loop_uses.push(lum);
        }
        self.face_mut(face)?.bbox = bbox;

        let data = self.shell_mut(shell)?;
        data.face_uses.push(fu);
        data.face_uses.push(fum);
        self.drop_lone_vertex(shell)?;
        Ok(fu)
    }

    /// Validates corners before anything is allocated.
    fn check_corners(&self, corners: &[Corner]) -> Result<()> {
        let mut seen = HashSet::new();
        let mut points = Vec::with_capacity(corners.len());
        for corner in corners {
            match *corner {
                Corner::Vertex(v) => {
                    if !seen.insert(v) {
                        return Err(GeometryError::degenerate_at(
                            "loop visits the same vertex twice",
                            self.vertex(v)?.index,
                        )
                        .into());
                    }
                    points.push(self.vertex(v)?.point);
                }
                Corner::Point(p) => points.push(p),
            }
        }
        if points.len() > 1 {
            let n = points.len();
            for i in 0..n {
                if n == 2 && i == 1 {
                    break;
                }
                if points[i] == points[(i + 1) % n] {
                    return Err(GeometryError::degenerate("zero-length edge between corners").into());
                }
            }
        }
        Ok(())
    }

    fn resolve_corner(&mut self, corner: Corner) -> VertexId {
        match corner {
            Corner::Vertex(v) => v,
            Corner::Point(point) => {
                let index = self.alloc_index();
                self.vertices.insert(VertexData {
                    index,
                    point,
                    uses: Vec::new(),
                })
            }
        }
    }

    pub(super) fn new_vertex_use(
        &mut self,
        v: VertexId,
        parent: VertexUseParent,
    ) -> Result<VertexUseId, TopologyError> {
        self.vertex(v)?;
        let index = self.alloc_index();
        let vu = self.vertex_uses.insert(VertexUseData {
            index,
            parent,
            vertex: v,
        });
        self.vertex_mut(v)?.uses.push(vu);
        Ok(vu)
    }

    /// A fresh edge from `va` to `vb` with its two uses. The uses are each
    /// other's mate and radial.
    pub(super) fn new_edge_pair(
        &mut self,
        parent: EdgeUseParent,
        mate_parent: EdgeUseParent,
        va: VertexId,
        vb: VertexId,
    ) -> Result<(EdgeUseId, EdgeUseId)> {
        let line = Line::through(&self.vertex(va)?.point, &self.vertex(vb)?.point)?;
        let eu = self.new_edge_use(parent, EdgeId::default());
        let eum = self.new_edge_use(mate_parent, EdgeId::default());
        let index = self.alloc_index();
        let e = self.edges.insert(EdgeData {
            index,
            edge_use: eu,
            line: Arc::new(line),
        });
        let vua = self.new_vertex_use(va, VertexUseParent::EdgeUse(eu))?;
        let vub = self.new_vertex_use(vb, VertexUseParent::EdgeUse(eum))?;
        for (id, mate, vu) in [(eu, eum, vua), (eum, eu, vub)] {
            let data = self.edge_use_mut(id)?;
            data.mate = mate;
            data.radial = mate;
            data.edge = e;
            data.vertex_use = vu;
        }
        Ok((eu, eum))
    }

    /// Allocates an edge-use whose links are filled in by the caller.
    pub(super) fn new_edge_use(&mut self, parent: EdgeUseParent, edge: EdgeId) -> EdgeUseId {
        let index = self.alloc_index();
        self.edge_uses.insert(EdgeUseData {
            index,
            parent,
            mate: EdgeUseId::default(),
            radial: EdgeUseId::default(),
            edge,
            vertex_use: VertexUseId::default(),
        })
    }

    /// A loop with two uses running through `corners` in opposite directions.
    /// Returns the use that runs in corner order.
    fn new_loop_pair(
        &mut self,
        parent: LoopParent,
        mate_parent: LoopParent,
        corners: &[Corner],
        orientation: Orientation,
    ) -> Result<LoopUseId> {
        let vertices: Vec<VertexId> = corners.iter().map(|&c| self.resolve_corner(c)).collect();

        let loop_index = self.alloc_index();
        let lu_index = self.alloc_index();
        let lum_index = self.alloc_index();
        let l = self.loops.insert(LoopData {
            index: loop_index,
            loop_use: LoopUseId::default(),
            bbox: Aabb::empty(),
        });
        let lu = self.loop_uses.insert(LoopUseData {
            index: lu_index,
            parent,
            mate: LoopUseId::default(),
            orientation,
            lp: l,
            down: LoopDown::Edges(Vec::new()),
        });
        let lum = self.loop_uses.insert(LoopUseData {
            index: lum_index,
            parent: mate_parent,
            mate: lu,
            orientation,
            lp: l,
            down: LoopDown::Edges(Vec::new()),
        });
        self.loop_use_mut(lu)?.mate = lum;

        if let [v] = vertices[..] {
            let vu = self.new_vertex_use(v, VertexUseParent::LoopUse(lu))?;
            let vum = self.new_vertex_use(v, VertexUseParent::LoopUse(lum))?;
            self.loop_use_mut(lu)?.down = LoopDown::Vertex(vu);
            self.loop_use_mut(lum)?.down = LoopDown::Vertex(vum);
        } else {
            let n = vertices.len();
            let mut eus = Vec::with_capacity(n);
            let mut eums = Vec::with_capacity(n);
            for i in 0..n {
                let (eu, eum) = self.new_edge_pair(
                    EdgeUseParent::LoopUse(lu),
                    EdgeUseParent::LoopUse(lum),
                    vertices[i],
                    vertices[(i + 1) % n],
                )?;
                eus.push(eu);
                eums.push(eum);
            }
            eums.reverse();
            self.loop_use_mut(lu)?.down = LoopDown::Edges(eus);
            self.loop_use_mut(lum)?.down = LoopDown::Edges(eums);
        }

        let bbox = self.loop_points_bbox(lu)?;
        let data = self.loop_def_mut(l)?;
        data.loop_use = lu;
        data.bbox = bbox;
        Ok(lu)
    }

    /// A lone vertex-use only lives in an otherwise empty shell.
    fn drop_lone_vertex(&mut self, shell: ShellId) -> Result<(), NmgError> {
        let data = self.shell(shell)?;
        let only_vertex = data.face_uses.is_empty()
            && data.loop_uses.is_empty()
            && data.edge_uses.is_empty();
        if only_vertex {
            return Ok(());
        }
        if let Some(vu) = data.vertex_use {
            self.shell_mut(shell)?.vertex_use = None;
            self.remove_vertex_use(vu)?;
        }
        Ok(())
    }
}
