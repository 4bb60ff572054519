use crate::error::BooleanError;
use crate::math::Tolerance;
use crate::topology::{Model, ShellId};

use super::engine::Boolean;
use super::select::BooleanOp;

/// Computes the boolean union of two shells.
///
/// A shorthand for [`Boolean`] with default settings apart from the
/// tolerance; the result is built in `a` and `b` is consumed.
pub struct Union {
    a: ShellId,
    b: ShellId,
    tolerance: Tolerance,
}

impl Union {
    /// Creates a new `Union` operation.
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
        Boolean::new(self.a, self.b, BooleanOp::Union)
            .with_tolerance(self.tolerance)
            .execute(model)
    }
}
