use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{GeometryError, Result, TopologyError};
use crate::math::Vector3;

use super::{EdgeId, EdgeUseId, Model};

/// The two uses of one face (or one wire) around an edge.
///
/// `fwd` runs along the reference direction of the edge, `bwd` against it.
/// For a face, `angle` is the direction the face leaves the edge, measured
/// around the reference direction; wires sort before every face.
struct Sheet {
    fwd: EdgeUseId,
    bwd: EdgeUseId,
    angle: Option<f64>,
    order: u64,
}

impl Model {
    /// Re-sorts the radial cycle of an edge by the angle of each face around it.
    ///
    /// # Errors
    ///
    /// Returns an error if the radial cycle is broken or the edge has zero length.
    pub fn relink_radial(&mut self, e: EdgeId) -> Result<()> {
        let uses = self.edge_uses_of(e)?;
        self.relink_radial_uses(e, &uses)
    }

    /// Makes `uses` the complete set of uses of `e` and links them radially.
    ///
    /// Sheets are ordered by increasing angle around the edge direction;
    /// the forward use of each sheet is linked to the backward use of the
    /// next, cyclically. A single sheet links its uses to each other.
    pub(super) fn relink_radial_uses(&mut self, e: EdgeId, uses: &[EdgeUseId]) -> Result<()> {
        let Some(&first) = uses.first() else {
            return Err(TopologyError::InvalidTopology("edge has no uses left".into()).into());
        };
        let start = self.eu_start(first)?;
        let (a, b) = self.eu_points(first)?;
        let dir = b - a;
        let len = dir.norm();
        if len == 0.0 {
            return Err(GeometryError::degenerate_at("zero-length edge", self.edge(e)?.index).into());
        }
        let dir = dir / len;
        let reference = perpendicular_to(&dir);
        let side = dir.cross(&reference);

        let members: HashSet<EdgeUseId> = uses.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut sheets = Vec::with_capacity(uses.len() / 2);
        for &eu in uses {
            if !seen.insert(eu) {
                continue;
            }
            let mate = self.edge_use(eu)?.mate;
            if !members.contains(&mate) {
                return Err(TopologyError::InvalidTopology(format!(
                    "edge-use #{} is around the edge without its mate",
                    self.edge_use(eu)?.index
                ))
                .into());
            }
            seen.insert(mate);

            let (fwd, bwd) = if self.eu_start(eu)? == start {
                (eu, mate)
            } else {
                (mate, eu)
            };
            let angle = match self.eu_face_use(fwd)? {
                Some(fu) => {
                    // The face lies to the left of its use: n × travel.
                    let w = self.face_use_normal(fu)?.cross(&dir);
                    Some(w.dot(&side).atan2(w.dot(&reference)))
                }
                None => None,
            };
            let order = self.edge_use(fwd)?.index.min(self.edge_use(bwd)?.index);
            sheets.push(Sheet {
                fwd,
                bwd,
                angle,
                order,
            });
        }

        sheets.sort_by(|x, y| {
            let by_angle = match (x.angle, y.angle) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(p), Some(q)) => p.total_cmp(&q),
            };
            by_angle.then(x.order.cmp(&y.order))
        });

        let n = sheets.len();
        for i in 0..n {
            let fwd = sheets[i].fwd;
            let bwd = sheets[(i + 1) % n].bwd;
            self.edge_use_mut(fwd)?.radial = bwd;
            self.edge_use_mut(bwd)?.radial = fwd;
        }
        for &eu in uses {
            self.edge_use_mut(eu)?.edge = e;
        }
        self.edge_mut(e)?.edge_use = sheets[0].fwd;
        Ok(())
    }
}

/// Any unit vector perpendicular to the unit vector `d`.
fn perpendicular_to(d: &Vector3) -> Vector3 {
    let axis = if d.x.abs() <= d.y.abs() && d.x.abs() <= d.z.abs() {
        Vector3::x()
    } else if d.y.abs() <= d.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    d.cross(&axis).normalize()
}
