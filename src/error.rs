//! Error types for pricing, implied volatility and forward calibration.

use crate::types::OptionType;
use thiserror::Error;
use uuid::Uuid;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, CalibError>;

/// Errors raised by the lattice pricer, the volatility solvers and the
/// forward/dividend calibrator.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum CalibError {
    /// Input rejected before any numerical work started.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the invalid parameter.
        message: String,
    },

    /// A per-instrument root finder hit its iteration cap.
    #[error(
        "{solver} did not converge for {option_type} strike {strike} after {iterations} iterations, last vol: {last_vol:.6}"
    )]
    ConvergenceFailure {
        /// Solver that gave up ("bisection" or "newton-raphson").
        solver: &'static str,
        /// Flavor of the offending instrument.
        option_type: OptionType,
        /// Strike of the offending instrument.
        strike: f64,
        /// Number of iterations attempted.
        iterations: u32,
        /// Last volatility estimate before giving up.
        last_vol: f64,
    },

    /// The forward/dividend fixed-point loop hit its iteration cap.
    #[error(
        "forward calibration {run_id} did not converge after {iterations} iterations (strike {strike}, last forward {last_forward:.6}, last dividend yield {last_dividend_yield:.6})"
    )]
    CalibrationFailure {
        /// Identifier of the calibration run.
        run_id: Uuid,
        /// Anchor strike of the run.
        strike: f64,
        /// Number of iterations attempted.
        iterations: u32,
        /// Last forward estimate.
        last_forward: f64,
        /// Last dividend yield estimate.
        last_dividend_yield: f64,
    },

    /// A value left the domain of a logarithm, square root or probability.
    #[error("numerical domain error in {operation}: {message}")]
    NumericalDomain {
        /// Operation that failed (e.g. "dividend yield from forward").
        operation: &'static str,
        /// Details including the offending value.
        message: String,
    },
}

impl CalibError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CalibError::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn domain(operation: &'static str, message: impl Into<String>) -> Self {
        CalibError::NumericalDomain {
            operation,
            message: message.into(),
        }
    }

    /// Returns true for iteration-cap failures, local or calibration-wide.
    #[must_use]
    pub fn is_convergence_failure(&self) -> bool {
        matches!(
            self,
            CalibError::ConvergenceFailure { .. } | CalibError::CalibrationFailure { .. }
        )
    }
}
