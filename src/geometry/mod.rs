pub mod line;
pub mod plane;

pub use line::Line;
pub use plane::Plane;
