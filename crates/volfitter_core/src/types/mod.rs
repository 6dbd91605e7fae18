//! Core data model, status and time types.
//!
//! This module provides:
//! - `status`: Ordered expiry status (`Tag`, `Status`)
//! - `quote`: Per-strike market quotes and pricing metadata
//! - `curve`: Raw, filtered and fitted per-expiry curves, plus the fitted surface
//! - `svi`: SVI total-variance parameters
//! - `time`: Business-day counting and ACT/365 year fractions
//! - `error`: Structured error types for curve construction and solvers

pub mod curve;
pub mod error;
pub mod quote;
pub mod status;
pub mod svi;
pub mod time;

pub use curve::{FilteredCurve, FitDiagnostics, FittedCurve, FittedPoint, FittedSurface, RawCurve};
pub use error::{CurveError, SolverError};
pub use quote::{MarketQuote, Moneyness, OptionKind, Pricing, Quote};
pub use status::{Status, Tag};
pub use svi::SviParameters;
pub use time::{business_days_between, is_business_day, is_weekend, year_fraction_act365};
