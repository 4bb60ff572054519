use crate::error::GeometryError;

use super::{Point3, Vector3};

/// Numeric tolerance threaded through every geometric computation.
///
/// `dist` is the absolute distance below which two points are the same point.
/// `perp` is the cosine below which two directions count as perpendicular;
/// `para = 1 - perp` is the cosine above which they count as parallel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    dist: f64,
    dist_sq: f64,
    perp: f64,
    para: f64,
}

const DEFAULT_DIST: f64 = 1e-6;
const DEFAULT_PERP: f64 = 1e-6;

impl Tolerance {
    /// Creates a tolerance with the given distance epsilon and a derived
    /// angular epsilon.
    ///
    /// # Errors
    ///
    /// Returns an error if `dist` is not a positive finite number.
    pub fn new(dist: f64) -> Result<Self, GeometryError> {
        Self::with_perp(dist, DEFAULT_PERP.min(dist))
    }

    /// Creates a tolerance with explicit distance and perpendicularity epsilons.
    ///
    /// # Errors
    ///
    /// Returns an error if either epsilon is not positive and finite, or if
    /// `perp` is not below one.
    pub fn with_perp(dist: f64, perp: f64) -> Result<Self, GeometryError> {
        if !(dist.is_finite() && dist > 0.0) {
            return Err(GeometryError::degenerate(format!(
                "distance tolerance must be positive, got {dist}"
            )));
        }
        if !(perp.is_finite() && perp > 0.0 && perp < 1.0) {
            return Err(GeometryError::degenerate(format!(
                "angular tolerance must lie in (0, 1), got {perp}"
            )));
        }
        Ok(Self {
            dist,
            dist_sq: dist * dist,
            perp,
            para: 1.0 - perp,
        })
    }

    /// Distance epsilon.
    #[must_use]
    pub fn dist(&self) -> f64 {
        self.dist
    }

    /// Squared distance epsilon.
    #[must_use]
    pub fn dist_sq(&self) -> f64 {
        self.dist_sq
    }

    /// Cosine below which two unit vectors are perpendicular.
    #[must_use]
    pub fn perp(&self) -> f64 {
        self.perp
    }

    /// Cosine above which two unit vectors are parallel.
    #[must_use]
    pub fn para(&self) -> f64 {
        self.para
    }

    /// Returns a copy with both epsilons scaled by `factor`.
    ///
    /// Used when a boolean evaluation restarts after a failed audit.
    #[must_use]
    pub fn widened(&self, factor: f64) -> Self {
        let dist = self.dist * factor;
        let perp = (self.perp * factor).min(0.5);
        Self {
            dist,
            dist_sq: dist * dist,
            perp,
            para: 1.0 - perp,
        }
    }

    /// Two points closer than the distance epsilon are the same point.
    #[must_use]
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm_squared() <= self.dist_sq
    }

    /// Unit vectors `a` and `b` are parallel or anti-parallel.
    #[must_use]
    pub fn parallel(&self, a: &Vector3, b: &Vector3) -> bool {
        a.dot(b).abs() >= self.para
    }

    /// Unit vectors `a` and `b` are perpendicular.
    #[must_use]
    pub fn perpendicular(&self, a: &Vector3, b: &Vector3) -> bool {
        a.dot(b).abs() <= self.perp
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            dist: DEFAULT_DIST,
            dist_sq: DEFAULT_DIST * DEFAULT_DIST,
            perp: DEFAULT_PERP,
            para: 1.0 - DEFAULT_PERP,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derived_epsilons() {
        let tol = Tolerance::new(1e-3).unwrap();
        assert_relative_eq!(tol.dist_sq(), 1e-6);
        assert_relative_eq!(tol.perp(), 1e-6);
        assert_relative_eq!(tol.para(), 1.0 - 1e-6);
    }

    #[test]
    fn rejects_non_positive_distance() {
        assert!(Tolerance::new(0.0).is_err());
        assert!(Tolerance::new(-1.0).is_err());
        assert!(Tolerance::new(f64::NAN).is_err());
    }

    #[test]
    fn widened_scales_both() {
        let tol = Tolerance::default().widened(10.0);
        assert_relative_eq!(tol.dist(), 1e-5);
        assert_relative_eq!(tol.perp(), 1e-5);
    }

    #[test]
    fn point_equality_uses_distance() {
        let tol = Tolerance::new(1e-3).unwrap();
        let a = Point3::new(0.0, 0.0, 0.0);
        assert!(tol.points_equal(&a, &Point3::new(5e-4, 0.0, 0.0)));
        assert!(!tol.points_equal(&a, &Point3::new(2e-3, 0.0, 0.0)));
    }
}
