//! # volfitter_core: Foundation for Volatility Surface Fitting
//!
//! ## Layer 1 (Foundation) Role
//!
//! volfitter_core is the bottom layer of the workspace, providing:
//! - Expiry status primitives: `Tag`, `Status` (`types::status`)
//! - The per-expiry data model: `Quote`, `RawCurve`, `FilteredCurve`,
//!   `FittedCurve`, `FittedSurface` (`types::curve`, `types::quote`)
//! - SVI total-variance parameters (`types::svi`)
//! - Calendar helpers: business-day counting, ACT/365 year fractions (`types::time`)
//! - Derivative-free and linear least-squares solvers (`math::solvers`)
//! - Robust statistics: median and MAD (`math::stats`)
//!
//! ## Dependencies
//!
//! Layer 1 has no dependencies on other volfitter crates:
//! - chrono: Date arithmetic
//! - serde: Serialisation of the output surface
//! - thiserror: Error types
//!
//! ## Usage Examples
//!
//! ```rust
//! use volfitter_core::types::{Status, Tag, SviParameters};
//!
//! let status = Status::ok().escalate(Status::warn("wide market"));
//! assert_eq!(status.tag(), Tag::Warn);
//!
//! let params = SviParameters::new(0.04, 0.1, 0.1, -0.5, 0.0);
//! assert!((params.total_variance(0.0) - 0.05).abs() < 1e-12);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod types;
