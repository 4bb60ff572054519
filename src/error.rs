use thiserror::Error;

use crate::audit::Defect;
use crate::topology::EntityKind;

/// Top-level error type for the NMG kernel.
#[derive(Debug, Error)]
pub enum NmgError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("structural defect: {0}")]
    StructuralDefect(#[from] Defect),

    #[error(transparent)]
    Boolean(#[from] BooleanError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Zero-length edge, zero-area loop, non-planar loop or a coincident result.
    Degenerate {
        reason: String,
        index: Option<u64>,
    },

    ZeroVector,

    /// A test fell inside the tolerance band and could not be decided.
    ToleranceAmbiguous {
        reason: String,
        index: Option<u64>,
    },
}

impl GeometryError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate {
            reason: reason.into(),
            index: None,
        }
    }

    pub(crate) fn degenerate_at(reason: impl Into<String>, index: u64) -> Self {
        Self::Degenerate {
            reason: reason.into(),
            index: Some(index),
        }
    }

    pub(crate) fn ambiguous_at(reason: impl Into<String>, index: u64) -> Self {
        Self::ToleranceAmbiguous {
            reason: reason.into(),
            index: Some(index),
        }
    }
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (label, reason, index) = match self {
            Self::ZeroVector => return f.write_str("zero-length vector"),
            Self::Degenerate { reason, index } => ("degenerate geometry", reason, index),
            Self::ToleranceAmbiguous { reason, index } => ("tolerance ambiguous", reason, index),
        };
        write!(f, "{label}: {reason}")?;
        if let Some(index) = index {
            write!(f, " (entity #{index})")?;
        }
        Ok(())
    }
}

/// Errors related to topological operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Stale or foreign handle.
    #[error("entity not found: {kind}")]
    EntityNotFound { kind: EntityKind },

    /// A destroy was attempted while other live entities still refer to the target.
    #[error("{kind} #{index} is still referenced by {users:?}")]
    InUse {
        kind: EntityKind,
        index: u64,
        users: Vec<u64>,
    },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

impl TopologyError {
    pub(crate) fn not_found(kind: EntityKind) -> Self {
        Self::EntityNotFound { kind }
    }
}

/// The boolean evaluation phases, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Intersect,
    Classify,
    Select,
    Glue,
    Audit,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Intersect => "intersect",
            Self::Classify => "classify",
            Self::Select => "select",
            Self::Glue => "glue",
            Self::Audit => "audit",
        };
        f.write_str(name)
    }
}

/// Errors returned by the boolean evaluator.
///
/// The model is always rolled back to its state before the evaluation started
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum BooleanError {
    #[error("boolean evaluation failed during {phase}: {source}")]
    EvaluationFailed {
        phase: Phase,
        #[source]
        source: Box<NmgError>,
    },

    #[error("boolean evaluation cancelled before {phase}")]
    Cancelled { phase: Phase },

    #[error("invalid boolean operands: {0}")]
    InvalidOperands(String),
}

impl BooleanError {
    pub(crate) fn failed(phase: Phase, source: impl Into<NmgError>) -> Self {
        Self::EvaluationFailed {
            phase,
            source: Box::new(source.into()),
        }
    }

    /// The phase the evaluation stopped in, if it got that far.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::EvaluationFailed { phase, .. } | Self::Cancelled { phase } => Some(*phase),
            Self::InvalidOperands(_) => None,
        }
    }

    /// The innermost kernel error behind an evaluation failure.
    #[must_use]
    pub fn root_cause(&self) -> Option<&NmgError> {
        let Self::EvaluationFailed { source, .. } = self else {
            return None;
        };
        let mut current: &NmgError = source;
        while let NmgError::Boolean(Self::EvaluationFailed { source, .. }) = current {
            current = source;
        }
        Some(current)
    }

    /// Returns `true` if the failure was caused by degenerate geometry.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self.root_cause(),
            Some(NmgError::Geometry(GeometryError::Degenerate { .. }))
        )
    }

    /// Returns `true` if the final audit rejected the result.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self.root_cause(), Some(NmgError::StructuralDefect(_)))
    }
}

/// Convenience type alias for results using [`NmgError`].
pub type Result<T, E = NmgError> = std::result::Result<T, E>;
