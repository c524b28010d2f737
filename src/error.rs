use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the solver and the spline builder.
///
/// Every precondition has its own variant so callers can tell a malformed
/// system apart from one that simply did not converge.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Matrix or vector dimensions do not fit together.
    #[error("shape mismatch in {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Unknown method name, unsupported spline order, bad tolerance and the like.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A diagonal entry used as a pivot is zero.
    #[error("zero pivot in row {row}")]
    ZeroPivot { row: usize },

    /// Sample x-values are not strictly increasing.
    #[error("sample x-values must be strictly increasing: xd[{index}] = {current} after {previous}")]
    DataOrdering {
        index: usize,
        previous: f64,
        current: f64,
    },

    /// The sweep budget ran out before successive iterates met the tolerance.
    #[error("no convergence after {sweeps} sweeps (step norm {step_norm:.3e}, tolerance {tolerance:.3e})")]
    NonConvergence {
        sweeps: usize,
        step_norm: f64,
        tolerance: f64,
    },

    /// Spline query outside the sampled domain.
    #[error("x = {x} is outside of the interpolation range [{min}, {max}]")]
    OutOfRange { x: f64, min: f64, max: f64 },
}
