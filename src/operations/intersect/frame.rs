use std::sync::Arc;

use crate::error::TopologyError;
use crate::geometry::Plane;
use crate::math::polygon_2d::{classify_point_in_loops, Containment};
use crate::math::{Aabb, Point2, Point3, Vector2, Vector3};
use crate::topology::{FaceId, Model};

/// A face seen in its own plane.
///
/// The 2D axes are mirrored when the face's `Same` use points against the
/// plane normal, so outer loops always come out counter-clockwise and holes
/// clockwise. Frames are plain values and can be built in parallel.
#[derive(Debug, Clone)]
pub struct FaceFrame {
    face: FaceId,
    index: u64,
    plane: Arc<Plane>,
    mirrored: bool,
    loops: Vec<Vec<Point2>>,
    bbox: Aabb,
}

impl FaceFrame {
    /// Projects the loops of `f`'s `Same` use.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the face or a link below it is stale.
    pub fn new(model: &Model, f: FaceId) -> Result<Self, TopologyError> {
        let data = model.face(f)?;
        let plane = Arc::clone(&data.plane);
        let mirrored = model.face_normal(f)?.dot(plane.normal()) < 0.0;
        let mut frame = Self {
            face: f,
            index: data.index,
            plane,
            mirrored,
            loops: Vec::new(),
            bbox: data.bbox,
        };
        frame.loops = model
            .face_loops(f)?
            .iter()
            .map(|lp| lp.iter().map(|p| frame.to_2d(p)).collect())
            .collect();
        Ok(frame)
    }

    #[must_use]
    pub fn face(&self) -> FaceId {
        self.face
    }

    /// Model index of the face, for error reports.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[must_use]
    pub fn plane(&self) -> &Arc<Plane> {
        &self.plane
    }

    #[must_use]
    pub fn loops(&self) -> &[Vec<Point2>] {
        &self.loops
    }

    #[must_use]
    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    /// Outward normal: the normal of the face's `Same` use.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        if self.mirrored {
            -self.plane.normal()
        } else {
            *self.plane.normal()
        }
    }

    #[must_use]
    pub fn to_2d(&self, p: &Point3) -> Point2 {
        let q = self.plane.project(p);
        if self.mirrored {
            Point2::new(q.x, -q.y)
        } else {
            q
        }
    }

    #[must_use]
    pub fn vector_to_2d(&self, v: &Vector3) -> Vector2 {
        let w = self.plane.project_vector(v);
        if self.mirrored {
            Vector2::new(w.x, -w.y)
        } else {
            w
        }
    }

    #[must_use]
    pub fn to_3d(&self, p: &Point2) -> Point3 {
        if self.mirrored {
            self.plane.lift(&Point2::new(p.x, -p.y))
        } else {
            self.plane.lift(p)
        }
    }

    /// Where the projection of `p` falls relative to the face.
    #[must_use]
    pub fn contains(&self, p: &Point3, eps: f64) -> Containment {
        self.contains_2d(&self.to_2d(p), eps)
    }

    #[must_use]
    pub fn contains_2d(&self, p: &Point2, eps: f64) -> Containment {
        classify_point_in_loops(p, &self.loops, eps)
    }
}
