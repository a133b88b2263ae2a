use mcmc_util::{GigError, ScheduleError};
use thiserror::Error;

/// Failures of a PRS-CS run. `Config` and `Schedule` are raised before
/// the first iteration; the others abort the chain where they occur.
#[derive(Debug, Error)]
pub enum McmcError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid sampling schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("iteration {iteration}: LD block {block} is not positive definite after adding diag(1/psi)")]
    Cholesky { iteration: usize, block: usize },

    #[error("iteration {iteration}: triangular solve failed on LD block {block}")]
    TriangularSolve { iteration: usize, block: usize },

    #[error("iteration {iteration}: local shrinkage draw failed for variant {variant}")]
    Gig {
        iteration: usize,
        variant: usize,
        #[source]
        source: GigError,
    },

    #[error("iteration {iteration}: cannot draw {what}: {message}")]
    Numerical {
        iteration: usize,
        what: &'static str,
        message: String,
    },
}

impl McmcError {
    pub fn config(msg: impl Into<String>) -> Self {
        McmcError::Config(msg.into())
    }

    /// Rejected before sampling started
    pub fn is_config(&self) -> bool {
        matches!(self, McmcError::Config(_) | McmcError::Schedule(_))
    }

    /// Iteration at which the chain failed, if it was running
    pub fn iteration(&self) -> Option<usize> {
        match self {
            McmcError::Config(_) | McmcError::Schedule(_) => None,
            McmcError::Cholesky { iteration, .. }
            | McmcError::TriangularSolve { iteration, .. }
            | McmcError::Gig { iteration, .. }
            | McmcError::Numerical { iteration, .. } => Some(*iteration),
        }
    }
}
