//! Optimisation and regression solvers used by calibration.
//!
//! ## Available Solvers
//!
//! - [`NelderMeadSolver`]: Derivative-free simplex minimiser for low-dimensional
//!   nonlinear objectives
//! - [`linear_least_squares`]: Ordinary least squares through the normal
//!   equations, solved with Cholesky
//!
//! ## Configuration
//!
//! [`NelderMeadConfig`] controls:
//! - `max_iterations`: Iteration cap (default: 2000)
//! - `initial_step`: Size of the starting simplex (default: 0.05)
//! - `x_tolerance` / `f_tolerance`: Simplex size and value spread at convergence
//!
//! ## Example
//!
//! ```
//! use volfitter_core::math::solvers::{linear_least_squares, NelderMeadSolver};
//!
//! // Profile a two-parameter problem: the slope is solved linearly for each
//! // trial shift, the shift is searched by Nelder–Mead.
//! let xs = [0.0, 1.0, 2.0, 3.0];
//! let ys: Vec<f64> = xs.iter().map(|x: &f64| 2.0 * (x - 0.5).abs()).collect();
//!
//! let objective = |p: &[f64]| {
//!     let design: Vec<[f64; 1]> = xs.iter().map(|x| [(x - p[0]).abs()]).collect();
//!     linear_least_squares(&design, &ys).map(|r| r.residual_ss).unwrap_or(1e10)
//! };
//! let result = NelderMeadSolver::with_defaults().minimize(objective, &[0.2]).unwrap();
//! assert!((result.params[0] - 0.5).abs() < 1e-6);
//! ```

mod least_squares;
mod nelder_mead;

pub use least_squares::{linear_least_squares, LeastSquaresResult};
pub use nelder_mead::{NelderMeadConfig, NelderMeadResult, NelderMeadSolver};
