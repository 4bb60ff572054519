use crate::error::Result;
use crate::math::polygon_3d::newell_normal;
use crate::topology::{Model, ShellId};

/// Computes the volume enclosed by a shell.
///
/// Sums `(1/6) * o . N` over the faces, where `o` is any point on the face
/// plane and `N` the Newell normal of the face's `Same` loops (holes wind the
/// other way and subtract). The result is signed: positive when the faces
/// point outward. Only meaningful for closed shells.
pub struct Volume {
    shell: ShellId,
}

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self { shell }
    }

    /// Executes the query, returning the signed volume.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the shell or a link below it is stale.
    pub fn execute(&self, model: &Model) -> Result<f64> {
        let mut six_volume = 0.0;
        for f in model.shell_faces(self.shell)? {
            let origin = model.face(f)?.plane.origin().coords;
            for lp in model.face_loops(f)? {
                if lp.len() < 3 {
                    continue;
                }
                six_volume += origin.dot(&newell_normal(&lp));
            }
        }
        Ok(six_volume / 6.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeFace};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn box_volume() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 3.0, 4.0))
            .execute(&mut model, r)
            .unwrap();
        let volume = Volume::new(s).execute(&model).unwrap();
        assert!((volume - 24.0).abs() < 1e-9, "expected 24, got {volume}");
    }

    #[test]
    fn volume_does_not_depend_on_position() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = MakeBox::new(p(-7.0, 11.0, 3.0), p(-6.0, 13.0, 3.5))
            .execute(&mut model, r)
            .unwrap();
        let volume = Volume::new(s).execute(&model).unwrap();
        assert!((volume - 1.0).abs() < 1e-9, "expected 1, got {volume}");
    }

    #[test]
    fn reversed_faces_give_negative_volume() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        for f in model.shell_faces(s).unwrap() {
            model.reverse_face(f).unwrap();
        }
        let volume = Volume::new(s).execute(&model).unwrap();
        assert!((volume + 1.0).abs() < 1e-9, "expected -1, got {volume}");
    }

    #[test]
    fn flat_sheet_through_origin_has_zero_volume() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = model.make_shell(r).unwrap();
        MakeFace::from_points(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)])
            .execute(&mut model, s)
            .unwrap();
        let volume = Volume::new(s).execute(&model).unwrap();
        assert!(volume.abs() < 1e-12);
    }
}
