//! Numerical building blocks.
//!
//! - `solvers`: Nelder–Mead simplex minimisation and linear least squares
//! - `stats`: Median and median absolute deviation

pub mod solvers;
pub mod stats;
