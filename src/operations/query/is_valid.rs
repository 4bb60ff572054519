use std::collections::HashSet;

use crate::audit::{check, check_geometry, Defect, DefectKind};
use crate::math::Tolerance;
use crate::topology::{EntityKind, EntityRef, Model, ShellId, Visitor};

/// Validates the topological and geometric consistency of one shell.
///
/// Runs the local audit on everything below the shell and the geometry audit
/// on its faces and edges. Use [`crate::audit::check_model`] for the
/// model-wide checks.
pub struct IsValid {
    shell: ShellId,
    tolerance: Tolerance,
}

impl IsValid {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self {
            shell,
            tolerance: Tolerance::default(),
        }
    }

    /// Sets the tolerance for the geometry checks.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the validation, returning `true` if the shell is valid.
    #[must_use]
    pub fn execute(&self, model: &Model) -> bool {
        self.defects(model).is_empty()
    }

    /// Returns every defect found below the shell.
    #[must_use]
    pub fn defects(&self, model: &Model) -> Vec<Defect> {
        let mut below = Collect::default();
        if model.walk(self.shell.into(), &mut below).is_err() {
            return vec![Defect::new(DefectKind::Dangling, EntityKind::Shell, 0)];
        }

        let mut defects: Vec<Defect> = below
            .entities
            .iter()
            .filter_map(|&entity| check(model, entity).err())
            .collect();
        defects.extend(
            check_geometry(model, &self.tolerance)
                .into_iter()
                .filter(|d| below.indices.contains(&d.index)),
        );
        defects
    }
}

#[derive(Default)]
struct Collect {
    entities: Vec<EntityRef>,
    indices: HashSet<u64>,
}

impl Visitor for Collect {
    fn enter(&mut self, model: &Model, entity: EntityRef) {
        if let Ok(index) = model.index_of(entity) {
            self.indices.insert(index);
        }
        self.entities.push(entity);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use crate::topology::Corner;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn box_is_valid() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        assert!(IsValid::new(s).execute(&model));
    }

    #[test]
    fn zero_length_wire_is_reported() {
        let mut model = Model::new();
        let r = model.make_region();
        let s = model.make_shell(r).unwrap();
        model
            .make_wire_edge(s, Corner::Point(p(0.0, 0.0, 0.0)), Corner::Point(p(1e-9, 0.0, 0.0)))
            .unwrap();
        let defects = IsValid::new(s).defects(&model);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].kind, DefectKind::ZeroLengthEdge);
    }

    #[test]
    fn defects_in_other_shells_are_ignored() {
        let mut model = Model::new();
        let r = model.make_region();
        let good = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let bad = model.make_shell(r).unwrap();
        model
            .make_wire_edge(bad, Corner::Point(p(5.0, 0.0, 0.0)), Corner::Point(p(5.0, 1e-9, 0.0)))
            .unwrap();
        assert!(IsValid::new(good).execute(&model));
        assert!(!IsValid::new(bad).execute(&model));
    }
}
