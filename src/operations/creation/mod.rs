mod make_box;
mod make_face;

pub use make_box::MakeBox;
pub use make_face::MakeFace;
