use std::sync::Arc;

use crate::error::{GeometryError, Result};
use crate::geometry::Plane;
use crate::math::polygon_2d::{classify_point_in_loops, Containment};
use crate::math::polygon_3d::newell_normal;
use crate::math::{Point3, Tolerance};
use crate::topology::{Corner, FaceUseId, Model, ShellId};

/// Creates a planar face from an ordered loop of corners, with optional holes.
///
/// The plane is fitted to the outer loop unless one is given with
/// [`MakeFace::with_plane`], in which case several faces can share it.
/// Loops are rewound as needed so the outer loop runs counter-clockwise
/// about the plane normal and holes run clockwise.
pub struct MakeFace {
    outer: Vec<Corner>,
    holes: Vec<Vec<Corner>>,
    plane: Option<Arc<Plane>>,
    tolerance: Tolerance,
}

impl MakeFace {
    /// Creates a new `MakeFace` operation from loop corners.
    #[must_use]
    pub fn new(outer: Vec<Corner>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
            plane: None,
            tolerance: Tolerance::default(),
        }
    }

    /// Creates a new `MakeFace` operation whose corners are all fresh points.
    #[must_use]
    pub fn from_points(points: Vec<Point3>) -> Self {
        Self::new(points.into_iter().map(Corner::Point).collect())
    }

    /// Adds an inner loop.
    #[must_use]
    pub fn with_hole(mut self, hole: Vec<Corner>) -> Self {
        self.holes.push(hole);
        self
    }

    /// Uses `plane` instead of fitting one to the outer loop.
    #[must_use]
    pub fn with_plane(mut self, plane: Arc<Plane>) -> Self {
        self.plane = Some(plane);
        self
    }

    /// Sets the tolerance used for the planarity checks.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the operation, creating the face in `shell`.
    ///
    /// Returns the face-use whose normal is the plane normal.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` if a loop encloses no area, leaves the plane, or a
    /// hole lies outside the outer loop; `EntityNotFound` for stale handles.
    pub fn execute(&self, model: &mut Model, shell: ShellId) -> Result<FaceUseId> {
        let tol = &self.tolerance;
        let outer_points = corner_points(model, &self.outer)?;
        let plane = match &self.plane {
            Some(plane) => Arc::clone(plane),
            None => Arc::new(Plane::from_points(&outer_points, tol)?),
        };

        let mut loops = Vec::with_capacity(1 + self.holes.len());
        loops.push(wound(&self.outer, &outer_points, &plane, tol, true)?);

        let outer_2d: Vec<_> = outer_points.iter().map(|p| plane.project(p)).collect();
        for hole in &self.holes {
            let points = corner_points(model, hole)?;
            let inside = points.iter().all(|p| {
                classify_point_in_loops(&plane.project(p), std::slice::from_ref(&outer_2d), tol.dist())
                    != Containment::Outside
            });
            if !inside {
                return Err(GeometryError::degenerate("hole lies outside the outer loop").into());
            }
            loops.push(wound(hole, &points, &plane, tol, false)?);
        }

        model.make_face(shell, plane, false, &loops)
    }
}

fn corner_points(model: &Model, corners: &[Corner]) -> Result<Vec<Point3>> {
    corners
        .iter()
        .map(|corner| match *corner {
            Corner::Vertex(v) => Ok(model.vertex(v)?.point),
            Corner::Point(p) => Ok(p),
        })
        .collect()
}

/// Returns the corners wound counter-clockwise (`ccw`) or clockwise about the
/// plane normal.
fn wound(
    corners: &[Corner],
    points: &[Point3],
    plane: &Plane,
    tol: &Tolerance,
    ccw: bool,
) -> Result<Vec<Corner>> {
    if let Some(off) = points.iter().find(|p| plane.signed_distance(p).abs() > tol.dist()) {
        return Err(GeometryError::degenerate(format!(
            "point ({}, {}, {}) lies off the face plane",
            off.x, off.y, off.z
        ))
        .into());
    }
    let short = (0..points.len()).find(|&i| tol.points_equal(&points[i], &points[(i + 1) % points.len()]));
    if let Some(i) = short {
        return Err(GeometryError::degenerate(format!(
            "edge from corner {i} has zero length within tolerance"
        ))
        .into());
    }
    let turn = newell_normal(points).dot(plane.normal());
    if turn.abs() <= tol.dist_sq() {
        return Err(GeometryError::degenerate("face loop encloses no area").into());
    }
    let mut out = corners.to_vec();
    if (turn > 0.0) != ccw {
        out.reverse();
    }
    Ok(out)
}
