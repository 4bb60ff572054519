use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use crate::audit::check_model;
use crate::error::{BooleanError, GeometryError, Phase, Result};
use crate::math::Tolerance;
use crate::operations::classify::{classify_shells, Classification};
use crate::operations::cut::{cut_shells, CutReport};
use crate::topology::{FaceId, Model, ShellId};

use super::cancel::CancelToken;
use super::glue::glue_result;
use super::select::{should_keep, BooleanOp, KeepDecision};

/// Factor the tolerance is widened by when an evaluation restarts.
const RESTART_WIDENING: f64 = 10.0;

/// Evaluates a boolean operation between two shells of one model.
///
/// The evaluation runs through its phases strictly in order: intersect,
/// classify, select, glue, audit. The result is built in shell `a`; shell
/// `b` is always consumed. Before the audit the result is split into its
/// boundary components, so a subtraction that cuts a bar in two or hollows
/// out a void yields one shell per component, `a` holding the largest. On
/// any error the model is rolled back to its state before the call.
///
/// If the final audit finds a defect, the evaluation restarts from the
/// original model with a tolerance ten times wider, up to `max_restarts`
/// times.
#[derive(Debug, Clone)]
pub struct Boolean {
    a: ShellId,
    b: ShellId,
    op: BooleanOp,
    tolerance: Tolerance,
    cancel: Option<CancelToken>,
    simplify: bool,
    max_restarts: usize,
    #[cfg(test)]
    trip: Option<(Phase, CancelToken)>,
}

impl Boolean {
    /// Creates a new `Boolean` operation.
    #[must_use]
    pub fn new(a: ShellId, b: ShellId, op: BooleanOp) -> Self {
        Self {
            a,
            b,
            op,
            tolerance: Tolerance::default(),
            cancel: None,
            simplify: true,
            max_restarts: 1,
            #[cfg(test)]
            trip: None,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Checks `token` before every phase.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Whether coplanar pieces of one original face are merged back and
    /// collinear vertices removed after gluing. On by default.
    #[must_use]
    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    #[must_use]
    pub fn with_max_restarts(mut self, max_restarts: usize) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Raises `token` when the evaluation reaches `phase`.
    #[cfg(test)]
    #[must_use]
    fn cancel_at(mut self, phase: Phase, token: CancelToken) -> Self {
        self.trip = Some((phase, token));
        self
    }

    /// Executes the operation, returning the shell holding the largest
    /// component of the result. That is always `a`.
    ///
    /// # Errors
    ///
    /// See [`Boolean::execute_shells`].
    pub fn execute(&self, model: &mut Model) -> Result<ShellId, BooleanError> {
        let shells = self.execute_shells(model)?;
        Ok(shells.first().copied().unwrap_or(self.a))
    }

    /// Executes the operation, returning one shell per boundary component of
    /// the result, `a` first. An empty result is the empty shell `a`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperands` for stale shells, `Cancelled` if the cancel
    /// token was raised, or `EvaluationFailed` with the phase and the
    /// underlying error. An intersection of solids that only touch reports
    /// `Degenerate` geometry.
    #[instrument(skip(self, model), fields(op = ?self.op))]
    pub fn execute_shells(&self, model: &mut Model) -> Result<Vec<ShellId>, BooleanError> {
        for s in [self.a, self.b] {
            if model.shell(s).is_err() {
                return Err(BooleanError::InvalidOperands("operand shell does not exist".into()));
            }
        }
        let snapshot = model.clone();
        let mut tol = self.tolerance;
        let mut restarts = 0;
        loop {
            match self.run(model, &tol) {
                Ok(shells) => return Ok(shells),
                Err(err) => {
                    *model = snapshot.clone();
                    if err.is_structural() && restarts < self.max_restarts {
                        restarts += 1;
                        let wider = tol.widened(RESTART_WIDENING);
                        warn!(restarts, from = tol.dist(), to = wider.dist(), %err, "restarting boolean with a wider tolerance");
                        tol = wider;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    fn checkpoint(&self, phase: Phase) -> Result<(), BooleanError> {
        #[cfg(test)]
        if let Some((at, token)) = &self.trip {
            if *at == phase {
                token.cancel();
            }
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            debug!(%phase, "boolean cancelled");
            return Err(BooleanError::Cancelled { phase });
        }
        debug!(%phase, "boolean phase");
        Ok(())
    }

    fn run(&self, model: &mut Model, tol: &Tolerance) -> Result<Vec<ShellId>, BooleanError> {
        let (a, b) = (self.a, self.b);
        self.checkpoint(Phase::Intersect)?;
        let trivial = self
            .trivial(model, tol)
            .map_err(|e| BooleanError::failed(Phase::Intersect, e))?;
        if !trivial {
            let report = cut_shells(model, a, b, tol).map_err(|e| BooleanError::failed(Phase::Intersect, e))?;

            self.checkpoint(Phase::Classify)?;
            let classes = classify_shells(model, a, b, tol).map_err(|e| BooleanError::failed(Phase::Classify, e))?;

            self.checkpoint(Phase::Select)?;
            let mergeable = select(model, a, &classes, &report, self.op)
                .map_err(|e| BooleanError::failed(Phase::Select, e))?;

            self.checkpoint(Phase::Glue)?;
            glue_result(model, a, b, &mergeable, self.simplify, tol)
                .map_err(|e| BooleanError::failed(Phase::Glue, e))?;
        }
        let shells = model
            .decompose_shell(a)
            .map_err(|e| BooleanError::failed(Phase::Glue, e))?;
        if shells.len() > 1 {
            debug!(components = shells.len(), "result split into shells");
        }

        self.checkpoint(Phase::Audit)?;
        let defects = check_model(model);
        if let Some(first) = defects.first() {
            warn!(defects = defects.len(), %first, "boolean result failed audit");
            return Err(BooleanError::failed(Phase::Audit, first.clone()));
        }
        Ok(shells)
    }

    /// Settles the cases that need no cutting: an empty operand, the same
    /// shell twice, or operands too far apart to meet. Returns `true` if the
    /// result is complete.
    fn trivial(&self, model: &mut Model, tol: &Tolerance) -> Result<bool> {
        let (a, b) = (self.a, self.b);
        if a == b {
            if self.op == BooleanOp::Subtract {
                model.empty_shell(a)?;
            }
            debug!("operands are the same shell");
            return Ok(true);
        }
        let a_empty = model.shell(a)?.is_empty();
        let b_empty = model.shell(b)?.is_empty();
        let apart = !a_empty && !b_empty && !model.shell_bbox(a)?.overlaps(&model.shell_bbox(b)?, tol.dist());
        if !(a_empty || b_empty || apart) {
            return Ok(false);
        }
        match self.op {
            BooleanOp::Union => model.join_shells(a, b)?,
            BooleanOp::Subtract => model.kill_shell(b)?,
            BooleanOp::Intersect => {
                model.empty_shell(a)?;
                model.kill_shell(b)?;
            }
        }
        debug!(a_empty, b_empty, apart, "operands do not meet");
        Ok(true)
    }
}

/// Removes every classified element the operation does not keep and turns
/// the flipped ones inside out. Returns the kept faces that may be merged
/// with coplanar neighbours: those cut from a face that has a piece lying on
/// the other shell.
fn select(
    model: &mut Model,
    a: ShellId,
    classes: &Classification,
    report: &CutReport,
    op: BooleanOp,
) -> Result<HashSet<FaceId>> {
    let on_origins: HashSet<FaceId> = classes
        .faces
        .iter()
        .filter(|(_, class)| class.is_on())
        .map(|(&f, _)| report.origin(f))
        .collect();

    let kept = classes
        .faces
        .values()
        .chain(classes.wire_edges.values())
        .chain(classes.wire_loops.values())
        .chain(classes.vertices.values())
        .filter(|&&class| should_keep(class, op).is_kept())
        .count();
    if kept == 0 && op == BooleanOp::Intersect && !on_origins.is_empty() {
        let index = model.shell(a)?.index;
        return Err(GeometryError::degenerate_at("intersection has zero volume", index).into());
    }

    let mut faces: Vec<(FaceId, _)> = classes.faces.iter().map(|(&f, &c)| (f, c)).collect();
    faces.sort_by_key(|&(f, _)| model.face(f).map_or(0, |d| d.index));

    let mut mergeable = HashSet::new();
    for (f, class) in faces {
        match should_keep(class, op) {
            KeepDecision::Discard => {
                let fu = model.face(f)?.face_use;
                model.kill_face_use(fu)?;
            }
            decision => {
                if decision == KeepDecision::KeepFlipped {
                    model.reverse_face(f)?;
                }
                if on_origins.contains(&report.origin(f)) {
                    mergeable.insert(f);
                }
            }
        }
    }

    for (&eu, &class) in &classes.wire_edges {
        if !should_keep(class, op).is_kept() && model.edge_use(eu).is_ok() {
            model.kill_wire_edge(eu)?;
        }
    }
    for (&lu, &class) in &classes.wire_loops {
        if !should_keep(class, op).is_kept() && model.loop_use(lu).is_ok() {
            model.kill_loop_use(lu)?;
        }
    }
    for (&vu, &class) in &classes.vertices {
        if !should_keep(class, op).is_kept() {
            model.kill_vertex_use(vu)?;
        }
    }
    debug!(kept, mergeable = mergeable.len(), "elements selected");
    Ok(mergeable)
}

/// Evaluates `op` on shells `a` and `b` with the given tolerance.
///
/// Equivalent to `Boolean::new(a, b, op).with_tolerance(*tol).execute(model)`.
///
/// # Errors
///
/// See [`Boolean::execute`].
pub fn evaluate(
    model: &mut Model,
    a: ShellId,
    b: ShellId,
    op: BooleanOp,
    tol: &Tolerance,
) -> Result<ShellId, BooleanError> {
    Boolean::new(a, b, op).with_tolerance(*tol).execute(model)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::NmgError;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeFace};
    use crate::operations::query::{BoundingBox, IsClosed, Volume};
    use crate::topology::{Corner, StructCounts};
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// The unit cube and a second box in one region.
    fn cube_and(lo: Point3, hi: Point3) -> (Model, ShellId, ShellId) {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let b = MakeBox::new(lo, hi).execute(&mut model, r).unwrap();
        (model, a, b)
    }

    fn assert_clean_solid(model: &Model, s: ShellId) {
        assert!(check_model(model).is_empty(), "{:?}", check_model(model));
        assert!(IsClosed::new(s).execute(model).unwrap());
    }

    // ── Offset cubes ──

    #[test]
    fn offset_cubes_union_is_one_long_box() {
        init_tracing();
        let (mut model, a, b) = cube_and(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        let s = evaluate(&mut model, a, b, BooleanOp::Union, &Tolerance::default()).unwrap();
        assert_eq!(s, a);
        assert!(model.shell(b).is_err());
        assert_clean_solid(&model, s);
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
        assert_eq!(model.shell_vertices(s).unwrap().len(), 8);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn offset_cubes_union_without_simplify_keeps_the_pieces() {
        let (mut model, a, b) = cube_and(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        let s = Boolean::new(a, b, BooleanOp::Union)
            .with_simplify(false)
            .execute(&mut model)
            .unwrap();
        assert_clean_solid(&model, s);
        // Left and right ends plus three pieces on each of four sides.
        assert_eq!(model.shell_faces(s).unwrap().len(), 14);
        assert_eq!(model.shell_vertices(s).unwrap().len(), 16);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn offset_cubes_intersect_to_half_box() {
        let (mut model, a, b) = cube_and(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        let s = evaluate(&mut model, a, b, BooleanOp::Intersect, &Tolerance::default()).unwrap();
        assert_clean_solid(&model, s);
        let bbox = BoundingBox::new(s).execute(&model).unwrap();
        assert_relative_eq!(bbox.extent().x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(bbox.extent().y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.extent().z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.min.x, 0.5, epsilon = 1e-9);
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn offset_cubes_subtract_leaves_the_free_half() {
        let (mut model, a, b) = cube_and(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        let s = evaluate(&mut model, a, b, BooleanOp::Subtract, &Tolerance::default()).unwrap();
        assert_clean_solid(&model, s);
        let bbox = BoundingBox::new(s).execute(&model).unwrap();
        assert_relative_eq!(bbox.min.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.max.x, 0.5, epsilon = 1e-9);
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 0.5, epsilon = 1e-9);
    }

    // ── Touching cubes ──

    #[test]
    fn touching_cubes_intersect_is_degenerate() {
        let (mut model, a, b) = cube_and(p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0));
        let before = StructCounts::of_model(&model).unwrap();
        let err = evaluate(&mut model, a, b, BooleanOp::Intersect, &Tolerance::default()).unwrap_err();
        assert!(err.is_degenerate(), "{err}");
        assert_eq!(err.phase(), Some(Phase::Select));
        // Rolled back.
        assert_eq!(StructCounts::of_model(&model).unwrap(), before);
        assert_eq!(model.shell_faces(b).unwrap().len(), 6);
    }

    #[test]
    fn touching_cubes_union_drops_the_shared_face() {
        let (mut model, a, b) = cube_and(p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0));
        let s = evaluate(&mut model, a, b, BooleanOp::Union, &Tolerance::default()).unwrap();
        assert_clean_solid(&model, s);
        assert_eq!(model.shell_faces(s).unwrap().len(), 10);
        assert_eq!(model.shell_vertices(s).unwrap().len(), 12);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn touching_cubes_subtract_leaves_a() {
        let (mut model, a, b) = cube_and(p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0));
        let s = evaluate(&mut model, a, b, BooleanOp::Subtract, &Tolerance::default()).unwrap();
        assert_clean_solid(&model, s);
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
        assert_eq!(model.shell_vertices(s).unwrap().len(), 8);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 1.0, epsilon = 1e-9);
    }

    // ── Disjoint and empty operands ──

    #[test]
    fn disjoint_cubes() {
        let far = (p(3.0, 0.0, 0.0), p(4.0, 1.0, 1.0));

        let (mut model, a, b) = cube_and(far.0, far.1);
        let shells = Boolean::new(a, b, BooleanOp::Union).execute_shells(&mut model).unwrap();
        assert_eq!(shells.len(), 2);
        assert_eq!(shells[0], a);
        for &s in &shells {
            assert_clean_solid(&model, s);
            assert_eq!(model.shell_faces(s).unwrap().len(), 6);
            assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 1.0, epsilon = 1e-9);
        }

        let (mut model, a, b) = cube_and(far.0, far.1);
        let s = evaluate(&mut model, a, b, BooleanOp::Intersect, &Tolerance::default()).unwrap();
        assert!(model.shell(s).unwrap().is_empty());
        assert!(check_model(&model).is_empty());

        let (mut model, a, b) = cube_and(far.0, far.1);
        let s = evaluate(&mut model, a, b, BooleanOp::Subtract, &Tolerance::default()).unwrap();
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
        assert!(model.shell(b).is_err());
        assert!(check_model(&model).is_empty());
    }

    #[test]
    fn union_with_an_empty_shell_is_identity() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let empty = model.make_shell(r).unwrap();
        let s = evaluate(&mut model, a, empty, BooleanOp::Union, &Tolerance::default()).unwrap();
        assert_eq!(s, a);
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
        assert_eq!(model.region(r).unwrap().shells, vec![a]);
        assert!(check_model(&model).is_empty());
    }

    // ── Identity ──

    #[test]
    fn intersect_with_itself_is_identity() {
        let (mut model, a, _) = cube_and(p(3.0, 0.0, 0.0), p(4.0, 1.0, 1.0));
        let s = evaluate(&mut model, a, a, BooleanOp::Intersect, &Tolerance::default()).unwrap();
        assert_eq!(s, a);
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
    }

    #[test]
    fn intersect_with_a_copy_is_identity() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let b = model.dup_shell(a).unwrap();
        let s = evaluate(&mut model, a, b, BooleanOp::Intersect, &Tolerance::default()).unwrap();
        assert_clean_solid(&model, s);
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
        assert_eq!(model.shell_vertices(s).unwrap().len(), 8);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 1.0, epsilon = 1e-9);
    }

    // ── Containment ──

    #[test]
    fn subtract_drills_a_through_hole() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(4.0, 4.0, 4.0))
            .execute(&mut model, r)
            .unwrap();
        let b = MakeBox::new(p(1.0, 1.0, -0.5), p(3.0, 3.0, 4.5))
            .execute(&mut model, r)
            .unwrap();
        let s = evaluate(&mut model, a, b, BooleanOp::Subtract, &Tolerance::default()).unwrap();
        assert_clean_solid(&model, s);
        // Four outer walls, top and bottom with a hole each, four inner walls.
        let faces = model.shell_faces(s).unwrap();
        assert_eq!(faces.len(), 10);
        let holed = faces
            .iter()
            .filter(|&&f| model.face_loops(f).unwrap().len() == 2)
            .count();
        assert_eq!(holed, 2);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 48.0, epsilon = 1e-9);
    }

    #[test]
    fn nested_box_subtracts_to_a_void() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
            .execute(&mut model, r)
            .unwrap();
        let b = MakeBox::new(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5))
            .execute(&mut model, r)
            .unwrap();
        let shells = Boolean::new(a, b, BooleanOp::Subtract).execute_shells(&mut model).unwrap();
        assert_eq!(shells.len(), 2);
        assert_eq!(shells[0], a);
        assert_eq!(model.region(r).unwrap().shells.len(), 2);
        // The outer skin stays in `a`; the void is its own inside-out shell.
        assert_clean_solid(&model, a);
        assert_relative_eq!(Volume::new(a).execute(&model).unwrap(), 8.0, epsilon = 1e-9);
        let void = shells[1];
        assert_eq!(model.shell_faces(void).unwrap().len(), 6);
        assert_relative_eq!(Volume::new(void).execute(&model).unwrap(), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn through_slab_cuts_a_bar_in_two() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(3.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let b = MakeBox::new(p(1.0, -1.0, -1.0), p(2.0, 2.0, 2.0))
            .execute(&mut model, r)
            .unwrap();
        let shells = Boolean::new(a, b, BooleanOp::Subtract).execute_shells(&mut model).unwrap();
        assert_eq!(shells.len(), 2);
        assert_eq!(model.region(r).unwrap().shells.len(), 2);
        let mut ends: Vec<f64> = Vec::new();
        for &s in &shells {
            assert_clean_solid(&model, s);
            assert_eq!(model.shell_faces(s).unwrap().len(), 6);
            assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 1.0, epsilon = 1e-9);
            ends.push(BoundingBox::new(s).execute(&model).unwrap().min.x);
        }
        ends.sort_by(f64::total_cmp);
        assert_relative_eq!(ends[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(ends[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn box_union_a_disjoint_sheet_keeps_both() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let b = model.make_shell(r).unwrap();
        MakeFace::from_points(vec![p(3.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(4.0, 1.0, 0.0), p(3.0, 1.0, 0.0)])
            .execute(&mut model, b)
            .unwrap();
        let shells = Boolean::new(a, b, BooleanOp::Union).execute_shells(&mut model).unwrap();
        assert_eq!(shells.len(), 2);
        assert_clean_solid(&model, a);
        assert_eq!(model.shell_faces(shells[1]).unwrap().len(), 1);
        assert!(check_model(&model).is_empty());
    }

    #[test]
    fn nested_box_intersects_to_the_inner_box() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
            .execute(&mut model, r)
            .unwrap();
        let b = MakeBox::new(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5))
            .execute(&mut model, r)
            .unwrap();
        let s = evaluate(&mut model, a, b, BooleanOp::Intersect, &Tolerance::default()).unwrap();
        assert_clean_solid(&model, s);
        assert_eq!(model.shell_faces(s).unwrap().len(), 6);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn corner_overlap_union_volume() {
        let (mut model, a, b) = cube_and(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5));
        let s = evaluate(&mut model, a, b, BooleanOp::Union, &Tolerance::default()).unwrap();
        assert_clean_solid(&model, s);
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 1.875, epsilon = 1e-9);
    }

    // ── Wires ──

    #[test]
    fn wire_through_a_box_is_trimmed() {
        let mut model = Model::new();
        let r = model.make_region();
        let w = model.make_shell(r).unwrap();
        model
            .make_wire_edge(w, Corner::Point(p(-1.0, 0.5, 0.5)), Corner::Point(p(2.0, 0.5, 0.5)))
            .unwrap();
        let b = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let s = evaluate(&mut model, w, b, BooleanOp::Subtract, &Tolerance::default()).unwrap();
        // The part inside the box is gone; the two outer parts remain.
        let data = model.shell(s).unwrap();
        assert!(data.face_uses.is_empty());
        assert_eq!(data.edge_uses.len(), 4);
        assert!(check_model(&model).is_empty());
    }

    // ── Control ──

    #[test]
    fn cancelled_before_start_leaves_the_model_alone() {
        let (mut model, a, b) = cube_and(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        let before = StructCounts::of_model(&model).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let err = Boolean::new(a, b, BooleanOp::Union)
            .with_cancel(token)
            .execute(&mut model)
            .unwrap_err();
        assert!(matches!(err, BooleanError::Cancelled { phase: Phase::Intersect }));
        assert_eq!(StructCounts::of_model(&model).unwrap(), before);
    }

    #[test]
    fn cancelled_mid_evaluation_rolls_back() {
        for phase in [Phase::Classify, Phase::Glue, Phase::Audit] {
            let (mut model, a, b) = cube_and(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
            let before = StructCounts::of_model(&model).unwrap();
            let token = CancelToken::new();
            let err = Boolean::new(a, b, BooleanOp::Union)
                .with_cancel(token.clone())
                .cancel_at(phase, token.clone())
                .execute(&mut model)
                .unwrap_err();
            assert!(token.is_cancelled());
            assert!(matches!(err, BooleanError::Cancelled { phase: at } if at == phase), "{err}");
            assert_eq!(StructCounts::of_model(&model).unwrap(), before);
            assert_eq!(model.shell_faces(a).unwrap().len(), 6);
            assert_eq!(model.shell_faces(b).unwrap().len(), 6);
            assert!(check_model(&model).is_empty());
        }
    }

    #[test]
    fn stale_operand_is_rejected() {
        let (mut model, a, b) = cube_and(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        model.kill_shell(b).unwrap();
        let err = evaluate(&mut model, a, b, BooleanOp::Union, &Tolerance::default()).unwrap_err();
        assert!(matches!(err, BooleanError::InvalidOperands(_)));
        assert_eq!(err.phase(), None);
    }

    #[test]
    fn restarts_are_bounded() {
        let (mut model, a, b) = cube_and(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        let s = Boolean::new(a, b, BooleanOp::Intersect)
            .with_max_restarts(0)
            .with_tolerance(Tolerance::new(1e-7).unwrap())
            .execute(&mut model)
            .unwrap();
        assert_relative_eq!(Volume::new(s).execute(&model).unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn boolean_error_reports_nmg_cause() {
        let (mut model, a, b) = cube_and(p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0));
        let err = evaluate(&mut model, a, b, BooleanOp::Intersect, &Tolerance::default()).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Some(NmgError::Geometry(GeometryError::Degenerate { .. }))
        ));
    }
}
