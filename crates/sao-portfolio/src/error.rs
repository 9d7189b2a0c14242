use crate::types::SolveStatus;

/// Errors produced while building or solving an allocation.
///
/// Each variant is a separate user-facing outcome; reporters match on the
/// variant, never on the message.
#[derive(Clone, Debug, PartialEq)]
pub enum AllocationError {
    /// Malformed input rejected before any solve attempt.
    InvalidInput { reason: String },
    /// One or more symbols lack a usable (finite, > 0) price.
    UnresolvedPrice { symbols: Vec<String> },
    /// The solver terminated without an optimal plan.
    NoPlan { status: SolveStatus },
    /// The solve process itself failed.
    SolverError { message: String },
}

impl AllocationError {
    pub(crate) fn invalid<S: Into<String>>(reason: S) -> Self {
        AllocationError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Solver status associated with this error, if any.
    pub fn status(&self) -> Option<SolveStatus> {
        match self {
            AllocationError::NoPlan { status } => Some(*status),
            _ => None,
        }
    }

    /// Stable upper-snake code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::InvalidInput { .. } => "INVALID_INPUT",
            AllocationError::UnresolvedPrice { .. } => "UNRESOLVED_PRICES",
            AllocationError::NoPlan { .. } => "NO_PLAN",
            AllocationError::SolverError { .. } => "SOLVER_ERROR",
        }
    }
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { reason } => write!(f, "invalid input: {reason}"),
            Self::UnresolvedPrice { symbols } => {
                write!(f, "no usable price for: {}", symbols.join(", "))
            }
            Self::NoPlan { status } => write!(f, "no plan available (status={status})"),
            Self::SolverError { message } => write!(f, "solver error: {message}"),
        }
    }
}

impl std::error::Error for AllocationError {}
