use crate::error::BooleanError;
use crate::math::Tolerance;
use crate::topology::{Model, ShellId};

use super::engine::Boolean;
use super::select::BooleanOp;

/// Computes the boolean intersection of two shells.
///
/// A shorthand for [`Boolean`] with default settings apart from the
/// tolerance; the result is built in `a` and `b` is consumed.
pub struct Intersect {
    a: ShellId,
    b: ShellId,
    tolerance: Tolerance,
}

impl Intersect {
    /// Creates a new `Intersect` operation.
    #[must_use]
    pub fn new(a: ShellId, b: ShellId) -> Self {
        Self {
            a,
            b,
            tolerance: Tolerance::default(),
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the operation, returning the result shell.
    ///
    /// # Errors
    ///
    /// See [`Boolean::execute`].
    pub fn execute(&self, model: &mut Model) -> Result<ShellId, BooleanError> {
        Boolean::new(self.a, self.b, BooleanOp::Intersect)
            .with_tolerance(self.tolerance)
            .execute(model)
    }
}
