use super::{Point3, Vector3};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// An empty box that any point or box will grow.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// The smallest box containing all `points`.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.grow(p);
        }
        bbox
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Extends the box to contain `p`.
    pub fn grow(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// The smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// The box grown by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vector3::new(margin, margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Boxes overlap or lie within `margin` of each other.
    #[must_use]
    pub fn overlaps(&self, other: &Self, margin: f64) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x <= other.max.x + margin
            && other.min.x <= self.max.x + margin
            && self.min.y <= other.max.y + margin
            && other.min.y <= self.max.y + margin
            && self.min.z <= other.max.z + margin
            && other.min.z <= self.max.z + margin
    }

    #[must_use]
    pub fn contains_point(&self, p: &Point3, margin: f64) -> bool {
        p.x >= self.min.x - margin
            && p.x <= self.max.x + margin
            && p.y >= self.min.y - margin
            && p.y <= self.max.y + margin
            && p.z >= self.min.z - margin
            && p.z <= self.max.z + margin
    }

    /// Length of the box diagonal, zero when empty.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.max - self.min).norm()
        }
    }

    #[must_use]
    pub fn extent(&self) -> Vector3 {
        if self.is_empty() {
            Vector3::zeros()
        } else {
            self.max - self.min
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn empty_box_grows_to_points() {
        let bbox = Aabb::from_points(&[p(1.0, 2.0, 3.0), p(-1.0, 0.0, 5.0)]);
        assert_eq!(bbox.min, p(-1.0, 0.0, 3.0));
        assert_eq!(bbox.max, p(1.0, 2.0, 5.0));
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn touching_boxes_overlap() {
        let a = Aabb::from_points(&[p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)]);
        let b = Aabb::from_points(&[p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0)]);
        let c = Aabb::from_points(&[p(1.1, 0.0, 0.0), p(2.0, 1.0, 1.0)]);
        assert!(a.overlaps(&b, 0.0));
        assert!(!a.overlaps(&c, 0.01));
        assert!(a.overlaps(&c, 0.2));
    }

    #[test]
    fn empty_never_overlaps() {
        let a = Aabb::from_points(&[p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)]);
        assert!(!a.overlaps(&Aabb::empty(), 10.0));
    }
}
