use crate::operations::classify::Class;

/// The type of boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

/// Decision about whether to keep a classified element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepDecision {
    Keep,
    KeepFlipped,
    Discard,
}

impl KeepDecision {
    #[must_use]
    pub fn is_kept(self) -> bool {
        !matches!(self, Self::Discard)
    }
}

/// Determines whether an element should be kept based on its class and the
/// boolean operation.
///
/// | Element          | Union   | Subtract(A-B) | Intersect |
/// |------------------|---------|---------------|-----------|
/// | A inside B       | discard | discard       | keep      |
/// | A on B, shared   | keep    | discard       | keep      |
/// | A on B, opposite | discard | keep          | discard   |
/// | A outside B      | keep    | keep          | discard   |
/// | B inside A       | discard | keep (flip)   | keep      |
/// | B on A, shared   | discard | discard       | discard   |
/// | B on A, opposite | discard | discard       | discard   |
/// | B outside A      | keep    | discard       | discard   |
///
/// Shared boundary is kept once, from `A`.
#[allow(clippy::match_same_arms)]
#[must_use]
pub fn should_keep(class: Class, op: BooleanOp) -> KeepDecision {
    match (class, op) {
        (Class::AinB, BooleanOp::Union) => KeepDecision::Discard,
        (Class::AinB, BooleanOp::Subtract) => KeepDecision::Discard,
        (Class::AinB, BooleanOp::Intersect) => KeepDecision::Keep,

        (Class::AonBShared, BooleanOp::Union) => KeepDecision::Keep,
        (Class::AonBShared, BooleanOp::Subtract) => KeepDecision::Discard,
        (Class::AonBShared, BooleanOp::Intersect) => KeepDecision::Keep,

        (Class::AonBAnti, BooleanOp::Union) => KeepDecision::Discard,
        (Class::AonBAnti, BooleanOp::Subtract) => KeepDecision::Keep,
        (Class::AonBAnti, BooleanOp::Intersect) => KeepDecision::Discard,

        (Class::AoutB, BooleanOp::Union) => KeepDecision::Keep,
        (Class::AoutB, BooleanOp::Subtract) => KeepDecision::Keep,
        (Class::AoutB, BooleanOp::Intersect) => KeepDecision::Discard,

        (Class::BinA, BooleanOp::Union) => KeepDecision::Discard,
        (Class::BinA, BooleanOp::Subtract) => KeepDecision::KeepFlipped,
        (Class::BinA, BooleanOp::Intersect) => KeepDecision::Keep,

        (Class::BonAShared | Class::BonAAnti, _) => KeepDecision::Discard,

        (Class::BoutA, BooleanOp::Union) => KeepDecision::Keep,
        (Class::BoutA, BooleanOp::Subtract) => KeepDecision::Discard,
        (Class::BoutA, BooleanOp::Intersect) => KeepDecision::Discard,
    }
}
