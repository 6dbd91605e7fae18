//! Error types for structured error handling.
//!
//! This module provides:
//! - `CurveError`: Errors from building a raw curve out of sourced data
//! - `SolverError`: Errors from the numerical solvers
//!
//! Data-quality problems (stale quotes, wide markets, too few strikes) are
//! never errors; they are expressed through [`Status`](super::Status).

use thiserror::Error;

/// Errors raised while assembling a [`RawCurve`](super::RawCurve).
///
/// # Examples
/// ```
/// use volfitter_core::types::CurveError;
///
/// let err = CurveError::DuplicateStrike { strike: 100.0 };
/// assert_eq!(format!("{}", err), "Duplicate strike 100 in curve");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Forward price is zero, negative or non-finite.
    #[error("Invalid forward price {forward}")]
    InvalidForward {
        /// The rejected forward.
        forward: f64,
    },

    /// Strike is zero, negative or non-finite.
    #[error("Invalid strike {strike}")]
    InvalidStrike {
        /// The rejected strike.
        strike: f64,
    },

    /// The same strike appears twice.
    #[error("Duplicate strike {strike} in curve")]
    DuplicateStrike {
        /// The repeated strike.
        strike: f64,
    },

    /// Time to expiry is NaN or infinite.
    #[error("Time to expiry is not finite: {time_to_expiry}")]
    NonFiniteTimeToExpiry {
        /// The rejected value.
        time_to_expiry: f64,
    },
}

/// Numerical solver errors.
///
/// # Examples
/// ```
/// use volfitter_core::types::SolverError;
///
/// let err = SolverError::DimensionMismatch { expected: 3, actual: 2 };
/// assert!(format!("{}", err).contains("expected 3"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// Linear system is singular or not positive definite.
    #[error("Singular system: {0}")]
    SingularSystem(String),

    /// Inputs have inconsistent dimensions.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}
