pub mod aabb;
pub mod intersect_2d;
pub mod intersect_3d;
pub mod polygon_2d;
pub mod polygon_3d;
pub mod tolerance;

pub use aabb::Aabb;
pub use tolerance::Tolerance;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;
