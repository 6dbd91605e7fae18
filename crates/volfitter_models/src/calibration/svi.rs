//! SVI calibration.
//!
//! ## Quasi-explicit approach
//!
//! For fixed `(smoothness, center)` the SVI total variance is linear in three
//! regressors:
//!
//! ```text
//! w(k) = level * 1 + (angle * tilt) * (k - center) + angle * sqrt((k - center)^2 + smoothness^2)
//! ```
//!
//! The inner stage solves those three coefficients by ordinary least squares.
//! The outer stage searches `(smoothness, center)` with Nelder–Mead, re-solving
//! the inner regression at every trial point. No constraints are imposed:
//! the result may have `smoothness <= 0`, `angle < 0` or `|tilt| > 1`.

use super::CalibrationError;
use crate::config::FitterConfig;
use volfitter_core::math::solvers::{linear_least_squares, NelderMeadConfig, NelderMeadSolver};
use volfitter_core::types::{FitDiagnostics, SviParameters};

/// Minimum market points for the three-coefficient regression.
pub const MIN_CALIBRATION_POINTS: usize = 3;

/// Objective value returned for trial points with no usable inner solution.
const DEGENERATE_RESIDUAL: f64 = 1e10;

/// Below this magnitude the regressed `angle` cannot be divided into `tilt`.
const MIN_ANGLE: f64 = 1e-12;

/// Market total variances keyed by log-moneyness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SviCalibrationData {
    /// `ln(K / F)` per point.
    pub log_moneyness: Vec<f64>,
    /// Market total variance `vol^2 * t` per point.
    pub total_variance: Vec<f64>,
}

impl SviCalibrationData {
    /// Create an empty data set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one market point.
    pub fn push(&mut self, log_moneyness: f64, total_variance: f64) {
        self.log_moneyness.push(log_moneyness);
        self.total_variance.push(total_variance);
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.log_moneyness.len()
    }

    /// Returns `true` if there are no points.
    pub fn is_empty(&self) -> bool {
        self.log_moneyness.is_empty()
    }

    /// Validate the data set.
    ///
    /// # Errors
    ///
    /// - `CalibrationError::InvalidMarketData` on length mismatch or non-finite values
    /// - `CalibrationError::InsufficientData` with fewer than three points
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.log_moneyness.len() != self.total_variance.len() {
            return Err(CalibrationError::invalid_market_data(format!(
                "{} log-moneyness values but {} total variances",
                self.log_moneyness.len(),
                self.total_variance.len()
            )));
        }
        if self.len() < MIN_CALIBRATION_POINTS {
            return Err(CalibrationError::insufficient_data(
                MIN_CALIBRATION_POINTS,
                self.len(),
            ));
        }
        if self
            .log_moneyness
            .iter()
            .chain(&self.total_variance)
            .any(|v| !v.is_finite())
        {
            return Err(CalibrationError::invalid_market_data(
                "non-finite log-moneyness or total variance",
            ));
        }
        Ok(())
    }
}

/// Calibrated parameters with diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SviCalibrationResult {
    /// Best-fit parameters.
    pub parameters: SviParameters,
    /// Search and residual diagnostics.
    pub diagnostics: FitDiagnostics,
}

/// A calibrator producing SVI parameters from market total variances.
pub trait SviCalibrator: Send + Sync {
    /// Name used in logs and configuration errors.
    fn name(&self) -> &'static str;

    /// Calibrate to `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is invalid or no finite fit exists.
    /// Failing to converge within the iteration cap is not an error; it is
    /// reported through `diagnostics.converged`.
    fn calibrate(&self, data: &SviCalibrationData) -> Result<SviCalibrationResult, CalibrationError>;
}

/// Unconstrained quasi-explicit SVI calibrator.
///
/// # Example
///
/// ```
/// use volfitter_core::types::SviParameters;
/// use volfitter_models::calibration::{QuasiExplicitSviCalibrator, SviCalibrationData, SviCalibrator};
///
/// let truth = SviParameters::new(0.04, 0.1, 0.1, -0.5, 0.0);
/// let mut data = SviCalibrationData::new();
/// for i in -5..=5 {
///     let k = 0.1 * i as f64;
///     data.push(k, truth.total_variance(k));
/// }
///
/// let result = QuasiExplicitSviCalibrator::default().calibrate(&data).unwrap();
/// assert!((result.parameters.level - 0.04).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuasiExplicitSviCalibrator {
    search: NelderMeadConfig,
    initial_smoothness: f64,
    initial_center: f64,
}

impl Default for QuasiExplicitSviCalibrator {
    fn default() -> Self {
        Self::from_config(&FitterConfig::default())
    }
}

impl QuasiExplicitSviCalibrator {
    /// Create a calibrator with an explicit outer search and seed.
    pub fn new(search: NelderMeadConfig, initial_smoothness: f64, initial_center: f64) -> Self {
        Self {
            search,
            initial_smoothness,
            initial_center,
        }
    }

    /// Create a calibrator from the fitter configuration section.
    pub fn from_config(config: &FitterConfig) -> Self {
        Self::new(
            config.nelder_mead(),
            config.initial_smoothness,
            config.initial_center,
        )
    }

    /// Outer search configuration.
    pub fn search_config(&self) -> &NelderMeadConfig {
        &self.search
    }

    /// Solve the linear inner stage for fixed `(smoothness, center)`.
    ///
    /// Returns `None` when the regression is singular, the regressed angle is
    /// too close to zero to recover the tilt, or the result is not finite.
    pub fn solve_inner(
        &self,
        data: &SviCalibrationData,
        smoothness: f64,
        center: f64,
    ) -> Option<(SviParameters, f64)> {
        let design: Vec<[f64; 3]> = data
            .log_moneyness
            .iter()
            .map(|&k| {
                let x = k - center;
                [1.0, x, (x * x + smoothness * smoothness).sqrt()]
            })
            .collect();

        let fit = linear_least_squares(&design, &data.total_variance).ok()?;
        let (level, angle_tilt, angle) = (
            fit.coefficients[0],
            fit.coefficients[1],
            fit.coefficients[2],
        );
        if angle.abs() < MIN_ANGLE {
            return None;
        }

        let parameters = SviParameters::new(level, angle, smoothness, angle_tilt / angle, center);
        (parameters.is_finite() && fit.residual_ss.is_finite()).then_some((parameters, fit.residual_ss))
    }
}

impl SviCalibrator for QuasiExplicitSviCalibrator {
    fn name(&self) -> &'static str {
        "unconstrained_quasi_explicit"
    }

    fn calibrate(&self, data: &SviCalibrationData) -> Result<SviCalibrationResult, CalibrationError> {
        data.validate()?;

        let objective = |p: &[f64]| {
            self.solve_inner(data, p[0], p[1])
                .map(|(_, rss)| rss)
                .unwrap_or(DEGENERATE_RESIDUAL)
        };
        let solver = NelderMeadSolver::new(self.search);
        let search = solver.minimize(objective, &[self.initial_smoothness, self.initial_center])?;

        let (parameters, rss) = self
            .solve_inner(data, search.params[0], search.params[1])
            .ok_or_else(|| {
                CalibrationError::numerical_instability(
                    "no finite inner regression at the search optimum",
                )
            })?;

        Ok(SviCalibrationResult {
            parameters,
            diagnostics: FitDiagnostics {
                iterations: search.iterations,
                evaluations: search.evaluations,
                residual_sum_of_squares: rss,
                rmse: (rss / data.len() as f64).sqrt(),
                converged: search.converged,
            },
        })
    }
}
