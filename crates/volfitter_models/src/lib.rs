//! # volfitter_models: Per-Expiry Fit Pipeline
//!
//! ## Layer 2 (Models) Role
//!
//! volfitter_models turns raw implied-volatility curves into fitted curves in
//! three stages, each escalating (never clearing) the expiry's status:
//!
//! ```text
//! RawCurve ──► FilterEngine ──► SurfaceFitter ──► ValidationEngine ──► FittedCurve
//!               (exclusions)     (SVI / mid)       (crossed PnL)
//! ```
//!
//! - [`filtering`]: Ordered exclusion and sufficiency checks
//! - [`calibration`]: SVI quasi-explicit calibrator and the fitter variants
//! - [`validation`]: Crossed-PnL scoring against every raw quote
//! - [`pipeline`]: Composition of the three stages for one curve or a surface
//! - [`config`]: Immutable per-stage configuration
//!
//! Expiries never share state, so a surface is processed expiry by expiry,
//! in parallel when the `parallel` feature is enabled.
//!
//! ## Feature Flags
//!
//! - `parallel` (default): Process expiries on the rayon thread pool

#![warn(missing_docs)]

pub mod calibration;
pub mod config;
pub mod filtering;
pub mod pipeline;
pub mod validation;

pub use calibration::{CalibrationError, QuasiExplicitSviCalibrator, SurfaceFitter, SviCalibrator};
pub use config::{FinalIvValidationConfig, FitterConfig, FitterKind, RawIvFilteringConfig, SviCalibratorKind};
pub use filtering::{FilterCheck, FilterEngine};
pub use pipeline::CurvePipeline;
pub use validation::{ValidationCheck, ValidationEngine};
