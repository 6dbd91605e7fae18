//! Calibration error types.

use thiserror::Error;
use volfitter_core::types::SolverError;

/// Calibration error type.
///
/// Raised by calibrators; the fitter converts every variant into a `Fail`
/// status on the affected expiry rather than aborting the cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Not enough market points for the model.
    #[error("Insufficient market data (required: {required}, provided: {provided})")]
    InsufficientData {
        /// Minimum required data points
        required: usize,
        /// Actual data points provided
        provided: usize,
    },

    /// Market data failed validation (non-finite inputs, mismatched lengths).
    #[error("Invalid market data: {message}")]
    InvalidMarketData {
        /// Description of the validation failure
        message: String,
    },

    /// NaN, Inf, or a degenerate system encountered.
    #[error("Numerical instability: {message}")]
    NumericalInstability {
        /// Description of the numerical issue
        message: String,
    },

    /// The selected calibrator exists in configuration but has no implementation.
    #[error("Calibrator '{name}' is not implemented")]
    NotImplemented {
        /// Configured calibrator name
        name: String,
    },

    /// Underlying solver failure.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl CalibrationError {
    /// Create an insufficient data error.
    pub fn insufficient_data(required: usize, provided: usize) -> Self {
        CalibrationError::InsufficientData { required, provided }
    }

    /// Create an invalid market data error.
    pub fn invalid_market_data(message: impl Into<String>) -> Self {
        CalibrationError::InvalidMarketData {
            message: message.into(),
        }
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(message: impl Into<String>) -> Self {
        CalibrationError::NumericalInstability {
            message: message.into(),
        }
    }
}
