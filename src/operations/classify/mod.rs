//! Inside/on/outside classification of one shell's elements against another.

mod ray;

pub use ray::{Probe, RAY_DIRECTIONS};

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use crate::error::{GeometryError, NmgError, Result};
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{Point3, Tolerance};
use crate::operations::intersect::FaceFrame;
use crate::topology::{EdgeUseId, FaceId, LoopDown, LoopUseId, Model, ShellId, VertexUseId};

/// Which boolean operand an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    A,
    B,
}

impl Operand {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Where an element lies relative to the other operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Inside,
    /// On the boundary, facing the same way.
    OnShared,
    /// On the boundary, facing the opposite way.
    OnAnti,
    Outside,
}

/// The eight classes of a boolean element: its operand and its position
/// relative to the other operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    AinB,
    AonBShared,
    AonBAnti,
    AoutB,
    BinA,
    BonAShared,
    BonAAnti,
    BoutA,
}

impl Class {
    #[must_use]
    pub fn new(operand: Operand, position: Position) -> Self {
        match (operand, position) {
            (Operand::A, Position::Inside) => Self::AinB,
            (Operand::A, Position::OnShared) => Self::AonBShared,
            (Operand::A, Position::OnAnti) => Self::AonBAnti,
            (Operand::A, Position::Outside) => Self::AoutB,
            (Operand::B, Position::Inside) => Self::BinA,
            (Operand::B, Position::OnShared) => Self::BonAShared,
            (Operand::B, Position::OnAnti) => Self::BonAAnti,
            (Operand::B, Position::Outside) => Self::BoutA,
        }
    }

    #[must_use]
    pub fn operand(self) -> Operand {
        match self {
            Self::AinB | Self::AonBShared | Self::AonBAnti | Self::AoutB => Operand::A,
            Self::BinA | Self::BonAShared | Self::BonAAnti | Self::BoutA => Operand::B,
        }
    }

    #[must_use]
    pub fn position(self) -> Position {
        match self {
            Self::AinB | Self::BinA => Position::Inside,
            Self::AonBShared | Self::BonAShared => Position::OnShared,
            Self::AonBAnti | Self::BonAAnti => Position::OnAnti,
            Self::AoutB | Self::BoutA => Position::Outside,
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self.position(), Position::OnShared | Position::OnAnti)
    }
}

/// The class of every element of two cut shells.
#[derive(Debug, Default, Clone)]
pub struct Classification {
    pub faces: HashMap<FaceId, Class>,
    /// Wire edges, by each of their shell-owned uses.
    pub wire_edges: HashMap<EdgeUseId, Class>,
    /// Wire loops, by each of their shell-owned uses.
    pub wire_loops: HashMap<LoopUseId, Class>,
    /// Lone shell vertices.
    pub vertices: HashMap<VertexUseId, Class>,
}

impl Classification {
    /// Number of faces in each class.
    #[must_use]
    pub fn face_counts(&self) -> HashMap<Class, usize> {
        let mut counts = HashMap::new();
        for &c in self.faces.values() {
            *counts.entry(c).or_default() += 1;
        }
        counts
    }
}

/// Classifies every face, wire and lone vertex of `a` against `b` and of `b`
/// against `a`. Both shells must already be cut against each other.
///
/// # Errors
///
/// Returns `Degenerate` for a face without interior, `ToleranceAmbiguous` if
/// no ray decides an element, or `EntityNotFound` for stale handles.
#[instrument(skip(model, tol))]
pub fn classify_shells(model: &Model, a: ShellId, b: ShellId, tol: &Tolerance) -> Result<Classification> {
    let probe_a = Probe::new(model, a, tol)?;
    let probe_b = Probe::new(model, b, tol)?;
    let mut out = Classification::default();
    classify_into(model, a, Operand::A, &probe_b, &mut out)?;
    classify_into(model, b, Operand::B, &probe_a, &mut out)?;
    debug!(
        faces = out.faces.len(),
        wires = out.wire_edges.len() + out.wire_loops.len(),
        vertices = out.vertices.len(),
        "shells classified"
    );
    Ok(out)
}

fn classify_into(model: &Model, s: ShellId, operand: Operand, other: &Probe, out: &mut Classification) -> Result<()> {
    let faces = model.shell_faces(s)?;
    let found = faces
        .par_iter()
        .map(|&f| -> Result<(FaceId, Class)> {
            let frame = FaceFrame::new(model, f)?;
            let class = Class::new(operand, other.classify_face(&frame)?);
            trace!(face = frame.index(), ?class, "face classified");
            Ok((f, class))
        })
        .collect::<Result<Vec<_>>>()?;
    out.faces.extend(found);

    let shell = model.shell(s)?;
    for &eu in &shell.edge_uses {
        let (p, q) = model.eu_points(eu)?;
        let mid = Point3::from((p.coords + q.coords) * 0.5);
        let index = model.edge_use(eu)?.index;
        out.wire_edges
            .insert(eu, Class::new(operand, other.classify_point(&mid, index)?));
    }
    for &lu in &shell.loop_uses {
        let data = model.loop_use(lu)?;
        let at = match &data.down {
            LoopDown::Edges(eus) => {
                let Some(&first) = eus.first() else {
                    return Err(GeometryError::degenerate_at("wire loop without edges", data.index).into());
                };
                let (p, q) = model.eu_points(first)?;
                Point3::from((p.coords + q.coords) * 0.5)
            }
            LoopDown::Vertex(vu) => model.vertex(model.vertex_use(*vu)?.vertex)?.point,
        };
        out.wire_loops
            .insert(lu, Class::new(operand, other.classify_point(&at, data.index)?));
    }
    if let Some(vu) = shell.vertex_use {
        let data = model.vertex_use(vu)?;
        let at = model.vertex(data.vertex)?.point;
        out.vertices
            .insert(vu, Class::new(operand, other.classify_point(&at, data.index)?));
    }
    Ok(())
}

/// Classifies a whole shell by the area-weighted majority of its faces.
///
/// A shell without faces is classified by its wires or lone vertex instead.
///
/// # Errors
///
/// Returns `Degenerate` for an empty shell, or any error from classifying
/// its elements.
pub fn classify_shell(model: &Model, s: ShellId, operand: Operand, other: &Probe) -> Result<Class> {
    let mut parts = Classification::default();
    classify_into(model, s, operand, other, &mut parts)?;

    let mut weight: HashMap<Class, f64> = HashMap::new();
    for (&f, &class) in &parts.faces {
        let frame = FaceFrame::new(model, f)?;
        let area: f64 = frame.loops().iter().map(|l| signed_area_2d(l)).sum();
        *weight.entry(class).or_default() += area.abs();
    }
    if weight.is_empty() {
        for &class in parts.wire_edges.values().chain(parts.wire_loops.values()).chain(parts.vertices.values()) {
            *weight.entry(class).or_default() += 1.0;
        }
    }
    weight
        .into_iter()
        .max_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(class, _)| class)
        .ok_or_else(|| NmgError::from(GeometryError::degenerate_at("shell has nothing to classify", model.shell(s).map_or(0, |d| d.index))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;
    use crate::operations::cut::cut_shells;
    use crate::topology::Corner;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn boxes(lo: Point3, hi: Point3) -> (Model, ShellId, ShellId) {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let b = MakeBox::new(lo, hi).execute(&mut model, r).unwrap();
        (model, a, b)
    }

    // ── Class table ──

    #[test]
    fn class_round_trips_operand_and_position() {
        for operand in [Operand::A, Operand::B] {
            for position in [Position::Inside, Position::OnShared, Position::OnAnti, Position::Outside] {
                let class = Class::new(operand, position);
                assert_eq!(class.operand(), operand);
                assert_eq!(class.position(), position);
            }
        }
        assert_eq!(Operand::A.other(), Operand::B);
        assert!(Class::BonAAnti.is_on());
        assert!(!Class::AoutB.is_on());
    }

    // ── Cut shells ──

    #[test]
    fn offset_boxes_classify_each_piece() {
        let (mut model, a, b) = boxes(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        let tol = Tolerance::default();
        cut_shells(&mut model, a, b, &tol).unwrap();
        let classes = classify_shells(&model, a, b, &tol).unwrap();
        let counts = classes.face_counts();

        // A: left, plus the left halves of four sides, lie outside B; the
        // right face lies inside; the right halves of four sides lie on B.
        assert_eq!(counts[&Class::AoutB], 5);
        assert_eq!(counts[&Class::AinB], 1);
        assert_eq!(counts[&Class::AonBShared], 4);
        assert_eq!(counts[&Class::BoutA], 5);
        assert_eq!(counts[&Class::BinA], 1);
        assert_eq!(counts[&Class::BonAShared], 4);
        assert!(!counts.contains_key(&Class::AonBAnti));
    }

    #[test]
    fn touching_boxes_meet_face_to_face() {
        let (mut model, a, b) = boxes(p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0));
        let tol = Tolerance::default();
        cut_shells(&mut model, a, b, &tol).unwrap();
        let counts = classify_shells(&model, a, b, &tol).unwrap().face_counts();
        assert_eq!(counts[&Class::AonBAnti], 1);
        assert_eq!(counts[&Class::BonAAnti], 1);
        assert_eq!(counts[&Class::AoutB], 5);
        assert_eq!(counts[&Class::BoutA], 5);
    }

    #[test]
    fn shared_classes_are_symmetric() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut model, r)
            .unwrap();
        let b = model.dup_shell(a).unwrap();
        let tol = Tolerance::default();
        let classes = classify_shells(&model, a, b, &tol).unwrap();
        let counts = classes.face_counts();
        assert_eq!(counts[&Class::AonBShared], 6);
        assert_eq!(counts[&Class::BonAShared], 6);

        for f in model.shell_faces(b).unwrap() {
            model.reverse_face(f).unwrap();
        }
        let counts = classify_shells(&model, a, b, &tol).unwrap().face_counts();
        assert_eq!(counts[&Class::AonBAnti], 6);
        assert_eq!(counts[&Class::BonAAnti], 6);
    }

    // ── Wires and shells ──

    #[test]
    fn wires_and_lone_vertices_classify_by_a_point() {
        let mut model = Model::new();
        let r = model.make_region();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
            .execute(&mut model, r)
            .unwrap();
        let w = model.make_shell(r).unwrap();
        let inside = model
            .make_wire_edge(w, Corner::Point(p(0.5, 0.5, 0.5)), Corner::Point(p(1.5, 1.5, 1.5)))
            .unwrap();
        let outside = model
            .make_wire_edge(w, Corner::Point(p(3.0, 0.5, 0.5)), Corner::Point(p(4.0, 0.5, 0.5)))
            .unwrap();
        let lone_shell = model.make_shell(r).unwrap();
        let vu = model.make_shell_vertex(lone_shell, Corner::Point(p(2.0, 1.0, 1.0))).unwrap();

        let tol = Tolerance::default();
        let classes = classify_shells(&model, w, a, &tol).unwrap();
        assert_eq!(classes.wire_edges[&inside], Class::AinB);
        assert_eq!(classes.wire_edges[&outside], Class::AoutB);
        assert_eq!(classes.faces.values().filter(|&&c| c == Class::BoutA).count(), 6);

        let lone = classify_shells(&model, lone_shell, a, &tol).unwrap();
        assert_eq!(lone.vertices[&vu], Class::AonBShared);
    }

    #[test]
    fn shell_majority_follows_area() {
        let (mut model, a, b) = boxes(p(0.25, 0.25, 0.25), p(0.75, 0.75, 0.75));
        let tol = Tolerance::default();
        let probe_a = Probe::new(&model, a, &tol).unwrap();
        let probe_b = Probe::new(&model, b, &tol).unwrap();
        assert_eq!(classify_shell(&model, b, Operand::B, &probe_a).unwrap(), Class::BinA);
        assert_eq!(classify_shell(&model, a, Operand::A, &probe_b).unwrap(), Class::AoutB);

        let r = model.make_region();
        let empty = model.make_shell(r).unwrap();
        assert!(classify_shell(&model, empty, Operand::A, &probe_b).is_err());
    }
}
