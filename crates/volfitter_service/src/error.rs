//! Error types for the volfitter service.

use crate::config::{ConfigError, VolfitterMode};
use chrono::NaiveDateTime;
use thiserror::Error;
use volfitter_core::types::{CurveError, OptionKind};
use volfitter_models::CalibrationError;

/// Service error type
///
/// These are collaborator failures: missing files, malformed rows, absent
/// forwards. Poor market data never produces one; it shows up as a curve
/// status instead.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The configured mode has no adapters
    #[error("Mode '{0}' is not currently supported")]
    UnsupportedMode(VolfitterMode),

    /// Fitter construction error
    #[error("Fitter setup error: {0}")]
    Calibration(#[from] CalibrationError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON write error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed or missing sample data
    #[error("Invalid sample data: {0}")]
    Data(String),

    /// No forward price for a requested expiry
    #[error("Missing forward price for {expiry}")]
    MissingForward {
        /// Expiry without a forward
        expiry: NaiveDateTime,
    },

    /// No pricing row for a quoted option
    #[error("Missing pricing for {kind:?} {strike} expiring {expiry}")]
    MissingPricing {
        /// Option expiry
        expiry: NaiveDateTime,
        /// Option strike
        strike: f64,
        /// Option type
        kind: OptionKind,
    },

    /// Supplier data could not form a curve
    #[error("Invalid curve for {expiry}: {source}")]
    Curve {
        /// Expiry of the rejected curve
        expiry: NaiveDateTime,
        /// Construction failure
        #[source]
        source: CurveError,
    },
}

impl ServiceError {
    /// Create a sample data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_error_display() {
        let err = ServiceError::data("bad cp_flag 'X'");
        assert!(err.to_string().contains("bad cp_flag"));

        let err = ServiceError::UnsupportedMode(VolfitterMode::Live);
        assert_eq!(err.to_string(), "Mode 'live' is not currently supported");
    }

    #[test]
    fn test_missing_forward_names_expiry() {
        let expiry = NaiveDate::from_ymd_opt(2020, 1, 17)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let err = ServiceError::MissingForward { expiry };
        assert!(err.to_string().contains("2020-01-17 15:00:00"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: ServiceError = ConfigError::Validation(vec!["x".to_string()]).into();
        assert!(matches!(err, ServiceError::Config(_)));
    }
}
