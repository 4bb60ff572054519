//! Boolean evaluation of two shells: union, intersection and subtraction.

mod cancel;
mod engine;
mod glue;
mod intersect_op;
mod select;
mod subtract;
mod union;

pub use cancel::CancelToken;
pub use engine::{evaluate, Boolean};
pub use glue::{glue_result, GlueReport};
pub use intersect_op::Intersect;
pub use select::{should_keep, BooleanOp, KeepDecision};
pub use subtract::Subtract;
pub use union::Union;
