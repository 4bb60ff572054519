use crate::math::polygon_3d::newell_normal;
use crate::math::Tolerance;
use crate::topology::{EntityKind, LoopDown, Model, Orientation};

use super::{Defect, DefectKind};

/// Checks the geometry hanging off the topology: edges have length, loop
/// vertices lie on their face plane, and loops wind the way their
/// orientation says (outer loops counter-clockwise about the `Same` normal,
/// holes clockwise).
#[must_use]
pub fn check_geometry(model: &Model, tol: &Tolerance) -> Vec<Defect> {
    let mut defects = Vec::new();

    for (e, data) in model.iter_edges() {
        if let Ok((a, b)) = model.edge_vertices(e) {
            if let (Ok(a), Ok(b)) = (model.vertex(a), model.vertex(b)) {
                if tol.points_equal(&a.point, &b.point) {
                    defects.push(Defect::new(DefectKind::ZeroLengthEdge, EntityKind::Edge, data.index));
                }
            }
        }
    }

    for (f, data) in model.iter_faces() {
        let Ok(fu) = model.face_same_use(f) else {
            continue;
        };
        let (Ok(fu_data), Ok(normal)) = (model.face_use(fu), model.face_use_normal(fu)) else {
            continue;
        };
        for &lu in &fu_data.loop_uses {
            let Ok(lu_data) = model.loop_use(lu) else {
                continue;
            };
            let Ok(points) = model.loop_points(lu) else {
                continue;
            };
            if points.iter().any(|p| data.plane.signed_distance(p).abs() > tol.dist()) {
                defects.push(Defect::new(DefectKind::OffPlane, EntityKind::Face, data.index));
            }
            if matches!(lu_data.down, LoopDown::Vertex(_)) {
                continue;
            }
            let turn = newell_normal(&points).dot(&normal);
            let wrong = match lu_data.orientation {
                Orientation::Same => turn <= 0.0,
                Orientation::Opposite => turn >= 0.0,
                Orientation::Unspecified => true,
            };
            if wrong {
                defects.push(Defect::new(DefectKind::WrongWinding, EntityKind::LoopUse, lu_data.index));
            }
        }
    }
    defects
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn box_geometry_is_consistent() {
        let mut model = Model::new();
        let r = model.make_region();
        MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 1.0, 3.0))
            .execute(&mut model, r)
            .unwrap();
        assert!(check_geometry(&model, &Tolerance::default()).is_empty());
    }

    #[test]
    fn reversed_face_keeps_its_loops_consistent() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let f = model.shell_faces(s).unwrap()[0];
        let before = model.face_normal(f).unwrap();
        model.reverse_face(f).unwrap();
        assert!((model.face_normal(f).unwrap() + before).norm() < 1e-12);
        assert!(check_geometry(&model, &Tolerance::default()).is_empty());
    }
}
