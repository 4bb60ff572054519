use crate::error::{GeometryError, Result};
use crate::math::{Point3, Tolerance};
use crate::topology::{Corner, FaceId, Model, RegionId, ShellId, VertexId};

use super::MakeFace;

/// Corner indices of the six faces, counter-clockwise seen from outside.
///
/// Corner `i` has x from bit 0, y from bit 1 and z from bit 2.
const FACES: [[usize; 4]; 6] = [
    [0, 2, 3, 1], // -z
    [4, 5, 7, 6], // +z
    [0, 1, 5, 4], // -y
    [2, 6, 7, 3], // +y
    [0, 4, 6, 2], // -x
    [1, 3, 7, 5], // +x
];

/// Creates a closed, axis-aligned box shell from two corner points.
///
/// The six faces share their vertices and are glued along all twelve edges.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
    tolerance: Tolerance,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
            tolerance: Tolerance::default(),
        }
    }

    /// Sets the tolerance used to reject flat boxes.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the operation, creating a new shell in `region`.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` if any extent is within tolerance of zero or the
    /// corners are not ordered; `EntityNotFound` if the region is stale.
    pub fn execute(&self, model: &mut Model, region: RegionId) -> Result<ShellId> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        let extent = hi - lo;
        if extent.iter().any(|&d| d <= self.tolerance.dist()) {
            return Err(GeometryError::degenerate(format!(
                "box extent ({}, {}, {}) is not positive",
                extent.x, extent.y, extent.z
            ))
            .into());
        }

        let points: Vec<Point3> = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { lo.x } else { hi.x },
                    if i & 2 == 0 { lo.y } else { hi.y },
                    if i & 4 == 0 { lo.z } else { hi.z },
                )
            })
            .collect();

        let shell = model.make_shell(region)?;
        let mut vertices: [Option<VertexId>; 8] = [None; 8];
        let mut faces: Vec<FaceId> = Vec::with_capacity(FACES.len());
        for quad in FACES {
            let corners = quad
                .iter()
                .map(|&i| vertices[i].map_or(Corner::Point(points[i]), Corner::Vertex))
                .collect();
            let fu = MakeFace::new(corners)
                .with_tolerance(self.tolerance)
                .execute(model, shell)?;
            let data = model.face_use(fu)?;
            let (face, lu) = (data.face, data.loop_uses[0]);
            for (&i, v) in quad.iter().zip(model.loop_vertices(lu)?) {
                vertices[i] = Some(v);
            }
            faces.push(face);
        }
        model.glue_faces(&faces)?;
        Ok(shell)
    }
}
