use crate::error::{GeometryError, Result};
use crate::math::{Point2, Point3, Tolerance, Vector2, Vector3};

/// An infinite plane in 3D space.
///
/// Defined by an origin point, and two orthogonal direction vectors
/// (`u_dir`, `v_dir`). The normal is `u_dir × v_dir`, so a loop that is
/// counter-clockwise in `(u, v)` is counter-clockwise about the normal.
///
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a new plane from an origin and two direction vectors.
    ///
    /// `v_dir` is re-orthogonalized against `u_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vectors are zero-length
    /// or parallel (degenerate plane).
    pub fn new(origin: Point3, u_dir: Vector3, v_dir: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        let v_len = v_dir.norm();
        if u_len == 0.0 || v_len == 0.0 {
            return Err(GeometryError::ZeroVector.into());
        }
        let u_dir = u_dir / u_len;
        let normal = u_dir.cross(&(v_dir / v_len));
        let normal_len = normal.norm();
        if normal_len < f64::EPSILON.sqrt() {
            return Err(GeometryError::degenerate("plane directions are parallel").into());
        }
        let normal = normal / normal_len;

        Ok(Self {
            origin,
            u_dir,
            v_dir: normal.cross(&u_dir),
            normal,
        })
    }

    /// Creates a plane from an origin and a normal vector.
    ///
    /// The U and V directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len == 0.0 {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let u_dir = normal.cross(&reference).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Fits a plane to a closed polygon with Newell's method.
    ///
    /// The normal follows the polygon's winding (counter-clockwise about the
    /// normal) and the origin is the vertex centroid.
    ///
    /// # Errors
    ///
    /// Returns `Degenerate` if the polygon has fewer than three points, encloses
    /// no area, or a vertex lies farther than `tol` from the fitted plane.
    pub fn from_points(points: &[Point3], tol: &Tolerance) -> Result<Self> {
        if points.len() < 3 {
            return Err(GeometryError::degenerate("polygon has fewer than three vertices").into());
        }
        let n = points.len();
        let mut normal = Vector3::zeros();
        let mut centroid = Vector3::zeros();
        for i in 0..n {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
            centroid += a.coords;
        }
        // |normal| is twice the enclosed area.
        if normal.norm() <= tol.dist_sq() {
            return Err(GeometryError::degenerate("polygon encloses no area").into());
        }
        #[allow(clippy::cast_precision_loss)]
        let origin = Point3::from(centroid / n as f64);
        let plane = Self::from_normal(origin, normal)?;

        if let Some(off) = points.iter().find(|p| plane.signed_distance(p).abs() > tol.dist()) {
            return Err(GeometryError::degenerate(format!(
                "point ({}, {}, {}) lies off the polygon plane",
                off.x, off.y, off.z
            ))
            .into());
        }
        Ok(plane)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from `p`, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&(p - self.origin))
    }

    /// Projects `p` into the plane's `(u, v)` frame.
    #[must_use]
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u_dir), d.dot(&self.v_dir))
    }

    #[must_use]
    pub fn project_vector(&self, v: &Vector3) -> Vector2 {
        Vector2::new(v.dot(&self.u_dir), v.dot(&self.v_dir))
    }

    /// Maps a `(u, v)` point back onto the plane.
    #[must_use]
    pub fn lift(&self, p: &Point2) -> Point3 {
        self.origin + self.u_dir * p.x + self.v_dir * p.y
    }

    /// The same plane with the normal reversed.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.origin,
            u_dir: self.v_dir,
            v_dir: self.u_dir,
            normal: -self.normal,
        }
    }

    /// Planes coincide within `tol`, regardless of normal sense.
    #[must_use]
    pub fn coincident(&self, other: &Self, tol: &Tolerance) -> bool {
        tol.parallel(&self.normal, &other.normal)
            && self.signed_distance(&other.origin).abs() <= tol.dist()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn frame_is_right_handed() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.0)).unwrap();
        assert_relative_eq!(plane.u_dir().cross(plane.v_dir()), *plane.normal());
    }

    #[test]
    fn newell_normal_follows_winding() {
        let tol = Tolerance::default();
        let ccw = [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(1.0, 1.0, 1.0), p(0.0, 1.0, 1.0)];
        let plane = Plane::from_points(&ccw, &tol).unwrap();
        assert_relative_eq!(*plane.normal(), Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(plane.signed_distance(&p(3.0, 3.0, 1.0)), 0.0);

        let cw: Vec<Point3> = ccw.iter().rev().copied().collect();
        let plane = Plane::from_points(&cw, &tol).unwrap();
        assert_relative_eq!(*plane.normal(), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let tol = Tolerance::default();
        let pts = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        assert!(Plane::from_points(&pts, &tol).is_err());
    }

    #[test]
    fn non_planar_points_are_rejected() {
        let tol = Tolerance::default();
        let pts = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.3), p(0.0, 1.0, 0.0)];
        assert!(Plane::from_points(&pts, &tol).is_err());
    }

    #[test]
    fn project_then_lift_round_trips_in_plane() {
        let plane = Plane::from_normal(p(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 0.0)).unwrap();
        let q = plane.lift(&Point2::new(0.25, -4.0));
        let back = plane.project(&q);
        assert_relative_eq!(back, Point2::new(0.25, -4.0), epsilon = 1e-12);
    }

    #[test]
    fn reversed_keeps_frame_right_handed() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)).unwrap();
        let rev = plane.reversed();
        assert_relative_eq!(rev.u_dir().cross(rev.v_dir()), *rev.normal());
        assert!(plane.coincident(&rev, &Tolerance::default()));
    }
}
