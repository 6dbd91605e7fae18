//! Per-expiry curve fitting.
//!
//! This module provides:
//! - [`SurfaceFitter`]: The fitter variants (mid-market passthrough, SVI)
//! - [`SviCalibrator`]: Calibrator capability used by the SVI fitter
//! - [`QuasiExplicitSviCalibrator`]: Two-stage unconstrained SVI calibration
//! - [`CalibrationError`]: Calibrator failures
//!
//! # Architecture
//!
//! ```text
//! FilteredCurve ──► SurfaceFitter ──┬─► MidMarket: vol = (bid + ask) / 2
//!                                   └─► Svi: included mids ──► SviCalibrator
//!                                              │
//!                                     Nelder–Mead over (smoothness, center)
//!                                              │
//!                                     OLS for (level, angle·tilt, angle)
//! ```
//!
//! Calibration failures never propagate as errors out of [`SurfaceFitter::fit`]:
//! they become a `Fail` status on the affected expiry.

mod error;
mod fitter;
mod svi;

pub use error::CalibrationError;
pub use fitter::{SurfaceFitter, INSUFFICIENT_SVI_POINTS_MESSAGE};
pub use svi::{
    QuasiExplicitSviCalibrator, SviCalibrationData, SviCalibrationResult, SviCalibrator,
    MIN_CALIBRATION_POINTS,
};
