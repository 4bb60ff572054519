use std::collections::HashMap;

use crate::error::Result;
use crate::topology::{EdgeId, Model, ShellId};

/// Checks whether a shell bounds a volume.
///
/// A shell is closed when it has faces, no wire edges or wire loops, and
/// every edge of its faces is shared by at least two face sheets of the same
/// shell. Non-manifold edges (four or more sheets) still count as closed.
pub struct IsClosed {
    shell: ShellId,
}

impl IsClosed {
    /// Creates a new `IsClosed` query.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self { shell }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the shell or a link below it is stale.
    pub fn execute(&self, model: &Model) -> Result<bool> {
        let shell = model.shell(self.shell)?;
        if shell.face_uses.is_empty() || !shell.edge_uses.is_empty() || !shell.loop_uses.is_empty() {
            return Ok(false);
        }

        // Each sheet contributes one edge-use per face-use side.
        let mut uses: HashMap<EdgeId, usize> = HashMap::new();
        for eu in model.shell_edge_uses(self.shell)? {
            if model.eu_face_use(eu)?.is_none() {
                return Ok(false);
            }
            *uses.entry(model.edge_use(eu)?.edge).or_default() += 1;
        }
        Ok(uses.values().all(|&n| n >= 4))
    }
}
