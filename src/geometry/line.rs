use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3};

/// An infinite line defined by an origin point and a direction vector.
///
/// The parametric form is: `P(t) = origin + t * direction`. Edges carry their
/// line behind an `Arc`, shared by every piece an edge is split into.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
}

impl Line {
    /// Creates a new line from an origin and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len == 0.0 {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
        })
    }

    /// The line through `a` and `b`, parameterized from `a`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide.
    pub fn through(a: &Point3, b: &Point3) -> Result<Self> {
        Self::new(*a, b - a)
    }

    /// Returns the origin point of the line.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction vector of the line.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Parameter of the orthogonal projection of `p` onto the line.
    #[must_use]
    pub fn parameter_of(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.direction)
    }

    #[must_use]
    pub fn distance_to(&self, p: &Point3) -> f64 {
        (p - self.point_at(self.parameter_of(p))).norm()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn through_points_is_unit_speed() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::new(1.0, 4.0, 0.0);
        let line = Line::through(&a, &b).unwrap();
        assert_relative_eq!(line.parameter_of(&b), 4.0);
        assert_relative_eq!(line.point_at(2.0), Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn distance_is_perpendicular() {
        let line = Line::new(Point3::origin(), Vector3::new(0.0, 0.0, 3.0)).unwrap();
        assert_relative_eq!(line.distance_to(&Point3::new(3.0, 4.0, 9.0)), 5.0);
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(Line::through(&Point3::origin(), &Point3::origin()).is_err());
    }
}
