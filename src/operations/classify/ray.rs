use rayon::prelude::*;
use tracing::trace;

use crate::error::{GeometryError, Result};
use crate::math::intersect_3d::{line_plane_intersect, LinePlaneRelation};
use crate::math::polygon_2d::{interior_point, Containment};
use crate::math::{Aabb, Point3, Tolerance, Vector3};
use crate::operations::intersect::{line_intervals, FaceFrame};
use crate::topology::{Model, ShellId};

use super::Position;

/// Directions tried in turn until one crosses the target cleanly. None of
/// them is parallel to a coordinate plane.
pub const RAY_DIRECTIONS: [[f64; 3]; 12] = [
    [0.573_945, 0.281_453, 0.769_006],
    [-0.412_243, 0.802_937, 0.430_520],
    [0.319_578, -0.588_267, 0.742_841],
    [-0.694_943, -0.361_621, 0.621_518],
    [0.871_318, 0.452_766, -0.189_230],
    [-0.227_476, 0.913_556, -0.337_151],
    [0.508_809, -0.711_636, -0.484_445],
    [-0.788_176, -0.137_595, -0.599_872],
    [0.146_284, 0.382_784, -0.912_183],
    [-0.352_655, -0.854_408, 0.381_603],
    [0.937_186, -0.213_918, 0.275_540],
    [-0.561_165, 0.497_092, 0.661_811],
];

/// What one ray saw.
enum Cast {
    Crossings(usize),
    /// The ray touched an edge, a vertex or a face plane and cannot be counted.
    Graze,
}

/// The faces of a target shell, prepared for repeated point and face tests.
#[derive(Debug, Clone)]
pub struct Probe {
    frames: Vec<FaceFrame>,
    bbox: Aabb,
    tol: Tolerance,
}

impl Probe {
    /// Projects every face of `target`.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the shell or a link below it is stale.
    pub fn new(model: &Model, target: ShellId, tol: &Tolerance) -> Result<Self> {
        let faces = model.shell_faces(target)?;
        let frames = faces
            .par_iter()
            .map(|&f| FaceFrame::new(model, f))
            .collect::<Result<Vec<_>, _>>()?;
        let bbox = frames.iter().fold(Aabb::empty(), |acc, f| acc.union(f.bbox()));
        Ok(Self {
            frames,
            bbox,
            tol: *tol,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Where a point lies relative to the target. A point on the target's
    /// boundary is `OnShared`.
    ///
    /// # Errors
    ///
    /// Returns `ToleranceAmbiguous` if every ray grazes the target.
    pub fn classify_point(&self, p: &Point3, index: u64) -> Result<Position, GeometryError> {
        if !self.bbox.contains_point(p, self.tol.dist()) {
            return Ok(Position::Outside);
        }
        let eps = self.tol.dist();
        let on = self
            .frames
            .iter()
            .any(|f| f.plane().signed_distance(p).abs() <= eps && f.contains(p, eps) != Containment::Outside);
        if on {
            return Ok(Position::OnShared);
        }
        self.cast_all(p, index)
    }

    /// Where a face lies relative to the target, judged at a point well
    /// inside the face.
    ///
    /// A face lying on a target face is `OnShared` when their outward normals
    /// agree and `OnAnti` when they oppose.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` for a face without interior, or
    /// `ToleranceAmbiguous` if every ray grazes the target.
    pub fn classify_face(&self, face: &FaceFrame) -> Result<Position, GeometryError> {
        let eps = self.tol.dist();
        let Some(inner) = interior_point(face.loops(), eps) else {
            return Err(GeometryError::degenerate_at("face has no interior", face.index()));
        };
        let p = face.to_3d(&inner);
        if !self.bbox.contains_point(&p, eps) {
            return Ok(Position::Outside);
        }
        for target in &self.frames {
            if target.plane().coincident(face.plane(), &self.tol) && target.contains(&p, eps) != Containment::Outside {
                return Ok(if target.normal().dot(&face.normal()) > 0.0 {
                    Position::OnShared
                } else {
                    Position::OnAnti
                });
            }
        }
        self.cast_all(&p, face.index())
    }

    fn cast_all(&self, p: &Point3, index: u64) -> Result<Position, GeometryError> {
        for (i, d) in RAY_DIRECTIONS.iter().enumerate() {
            let dir = Vector3::new(d[0], d[1], d[2]).normalize();
            match self.cast(p, &dir) {
                Cast::Crossings(n) => {
                    if i > 0 {
                        trace!(index, rays = i + 1, "classification ray perturbed");
                    }
                    return Ok(if n % 2 == 1 {
                        Position::Inside
                    } else {
                        Position::Outside
                    });
                }
                Cast::Graze => {}
            }
        }
        Err(GeometryError::ambiguous_at("every classification ray grazes the other shell", index))
    }

    fn cast(&self, p: &Point3, dir: &Vector3) -> Cast {
        let eps = self.tol.dist();
        let mut crossings = 0;
        for target in &self.frames {
            match line_plane_intersect(p, dir, target.plane(), &self.tol) {
                LinePlaneRelation::Parallel => {}
                LinePlaneRelation::OnPlane => {
                    let ahead = line_intervals(
                        target.loops(),
                        &target.to_2d(p),
                        &target.vector_to_2d(dir).normalize(),
                        eps,
                    );
                    if ahead.iter().any(|&(_, end)| end > -eps) {
                        return Cast::Graze;
                    }
                }
                LinePlaneRelation::Point { point, t } => {
                    if t < -eps {
                        continue;
                    }
                    match target.contains(&point, eps) {
                        Containment::Outside => {}
                        Containment::On => return Cast::Graze,
                        Containment::Inside if t <= eps => return Cast::Graze,
                        Containment::Inside => crossings += 1,
                    }
                }
            }
        }
        Cast::Crossings(crossings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn box_probe(model: &mut Model) -> (ShellId, Probe) {
        let r = model.make_region();
        let s = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
            .execute(model, r)
            .unwrap();
        let probe = Probe::new(model, s, &Tolerance::default()).unwrap();
        (s, probe)
    }

    #[test]
    fn ray_directions_are_unit_and_skewed() {
        for d in RAY_DIRECTIONS {
            let v = Vector3::new(d[0], d[1], d[2]);
            assert!((v.norm() - 1.0).abs() < 1e-5);
            assert!(d.iter().all(|c| c.abs() > 0.1));
        }
    }

    // ── Points ──

    #[test]
    fn points_inside_outside_and_on() {
        let mut model = Model::new();
        let (_, probe) = box_probe(&mut model);
        assert_eq!(probe.classify_point(&p(1.0, 1.0, 1.0), 0).unwrap(), Position::Inside);
        assert_eq!(probe.classify_point(&p(3.0, 1.0, 1.0), 0).unwrap(), Position::Outside);
        assert_eq!(probe.classify_point(&p(1.0, 1.0, 2.0), 0).unwrap(), Position::OnShared);
        assert_eq!(probe.classify_point(&p(2.0, 2.0, 2.0), 0).unwrap(), Position::OnShared);
    }

    #[test]
    fn points_within_tolerance_of_a_face_are_on() {
        let mut model = Model::new();
        let (_, probe) = box_probe(&mut model);
        assert_eq!(probe.classify_point(&p(2.0 + 5e-7, 1.0, 1.0), 0).unwrap(), Position::OnShared);
        assert_eq!(probe.classify_point(&p(1.999, 1.999, 1.999), 0).unwrap(), Position::Inside);
    }

    #[test]
    fn near_tangent_rays_are_retried() {
        // Points placed exactly on the first ray's path through box edges and
        // corners: the first cast grazes and a later direction decides.
        let mut model = Model::new();
        let (_, probe) = box_probe(&mut model);
        let first = Vector3::new(RAY_DIRECTIONS[0][0], RAY_DIRECTIONS[0][1], RAY_DIRECTIONS[0][2]).normalize();
        let corner = p(2.0, 2.0, 2.0);
        let inside = corner - first * 0.5;
        assert!(matches!(probe.cast(&inside, &first), Cast::Graze));
        assert_eq!(probe.classify_point(&inside, 0).unwrap(), Position::Inside);

        let outside = corner + first * 0.5;
        assert_eq!(probe.classify_point(&outside, 0).unwrap(), Position::Outside);

        // Passing a hair's breadth from an edge, inside the tolerance band.
        let edge_point = p(2.0, 1.0, 2.0) + Vector3::new(0.0, 0.0, 1e-7);
        let near_edge = edge_point - first * 0.25;
        assert!(matches!(probe.cast(&near_edge, &first), Cast::Graze));
        assert_eq!(probe.classify_point(&near_edge, 0).unwrap(), Position::Inside);
    }

    // ── Faces ──

    #[test]
    fn coplanar_faces_compare_normals() {
        let mut model = Model::new();
        let (_, probe) = box_probe(&mut model);
        let r = model.make_region();
        let other = MakeBox::new(p(0.5, 0.5, 2.0), p(1.5, 1.5, 3.0))
            .execute(&mut model, r)
            .unwrap();
        let mut seen = Vec::new();
        for f in model.shell_faces(other).unwrap() {
            let frame = FaceFrame::new(&model, f).unwrap();
            seen.push(probe.classify_face(&frame).unwrap());
        }
        // The bottom of the small box sits on the top of the big one, facing it.
        assert_eq!(seen.iter().filter(|&&c| c == Position::OnAnti).count(), 1);
        assert_eq!(seen.iter().filter(|&&c| c == Position::Outside).count(), 5);
    }

    #[test]
    fn faces_inside_and_shared() {
        let mut model = Model::new();
        let (s, probe) = box_probe(&mut model);
        let copy = model.dup_shell(s).unwrap();
        for f in model.shell_faces(copy).unwrap() {
            let frame = FaceFrame::new(&model, f).unwrap();
            assert_eq!(probe.classify_face(&frame).unwrap(), Position::OnShared);
        }
        let r = model.make_region();
        let inner = MakeBox::new(p(0.5, 0.5, 0.5), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        for f in model.shell_faces(inner).unwrap() {
            let frame = FaceFrame::new(&model, f).unwrap();
            assert_eq!(probe.classify_face(&frame).unwrap(), Position::Inside);
        }
    }

    #[test]
    fn every_ray_grazing_is_ambiguous() {
        // Every ray starts on the bottom face.
        let mut model = Model::new();
        let r = model.make_region();
        let s = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
            .execute(&mut model, r)
            .unwrap();
        let probe = Probe::new(&model, s, &Tolerance::default()).unwrap();
        let on_face = p(1.0, 1.0, 0.0);
        assert!(matches!(probe.cast_all(&on_face, 7), Err(GeometryError::ToleranceAmbiguous { index: Some(7), .. })));
    }
}
