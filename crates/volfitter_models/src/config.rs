//! Per-stage configuration.
//!
//! Each stage is built from one immutable section. Sections deserialise with
//! serde defaults, so a partial TOML table fills the rest from the defaults
//! below. `collect_errors` appends human-readable problems for the service
//! layer to report in one batch.

use serde::{Deserialize, Serialize};
use volfitter_core::math::solvers::NelderMeadConfig;

/// Thresholds for the filtering engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIvFilteringConfig {
    /// Minimum share of originally listed strikes that must survive filtering.
    #[serde(default = "default_min_valid_strikes_fraction")]
    pub min_valid_strikes_fraction: f64,

    /// Maximum age of the last trade, in business days.
    #[serde(default = "default_max_last_trade_age_days")]
    pub max_last_trade_age_days: i64,

    /// Multiplier on the MAD of market widths above the median width.
    #[serde(default = "default_wide_market_outlier_mad_threshold")]
    pub wide_market_outlier_mad_threshold: f64,
}

fn default_min_valid_strikes_fraction() -> f64 {
    0.1
}

fn default_max_last_trade_age_days() -> i64 {
    3
}

fn default_wide_market_outlier_mad_threshold() -> f64 {
    5.0
}

impl Default for RawIvFilteringConfig {
    fn default() -> Self {
        Self {
            min_valid_strikes_fraction: default_min_valid_strikes_fraction(),
            max_last_trade_age_days: default_max_last_trade_age_days(),
            wide_market_outlier_mad_threshold: default_wide_market_outlier_mad_threshold(),
        }
    }
}

impl RawIvFilteringConfig {
    /// Append validation errors for this section.
    pub fn collect_errors(&self, errors: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&self.min_valid_strikes_fraction) {
            errors.push(format!(
                "raw_iv_filtering.min_valid_strikes_fraction must be in [0, 1], got {}",
                self.min_valid_strikes_fraction
            ));
        }
        if self.max_last_trade_age_days < 0 {
            errors.push(format!(
                "raw_iv_filtering.max_last_trade_age_days must be non-negative, got {}",
                self.max_last_trade_age_days
            ));
        }
        if !(self.wide_market_outlier_mad_threshold.is_finite()
            && self.wide_market_outlier_mad_threshold >= 0.0)
        {
            errors.push(format!(
                "raw_iv_filtering.wide_market_outlier_mad_threshold must be a non-negative number, got {}",
                self.wide_market_outlier_mad_threshold
            ));
        }
    }
}

/// Which fitter produces the final curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitterKind {
    /// Fitted vol equals the market mid at each two-sided strike.
    MidMarket,
    /// SVI calibration per expiry.
    #[default]
    Svi,
}

/// Which SVI calibrator the SVI fitter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SviCalibratorKind {
    /// Quasi-explicit calibration with no parameter constraints.
    #[default]
    UnconstrainedQuasiExplicit,
    /// Constrained calibration. Not implemented; rejected by validation.
    Constrained,
}

/// Fitter selection and calibrator search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitterConfig {
    /// Fitter variant.
    #[serde(default)]
    pub kind: FitterKind,

    /// Calibrator variant (SVI fitter only).
    #[serde(default)]
    pub calibrator: SviCalibratorKind,

    /// Starting smoothness for the outer search.
    #[serde(default = "default_initial_smoothness")]
    pub initial_smoothness: f64,

    /// Starting center for the outer search.
    #[serde(default)]
    pub initial_center: f64,

    /// Size of the initial simplex.
    #[serde(default = "default_initial_step")]
    pub initial_step: f64,

    /// Outer search iteration cap.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Simplex size at convergence.
    #[serde(default = "default_x_tolerance")]
    pub x_tolerance: f64,

    /// Objective spread at convergence.
    #[serde(default = "default_f_tolerance")]
    pub f_tolerance: f64,
}

fn default_initial_smoothness() -> f64 {
    0.1
}

fn default_initial_step() -> f64 {
    0.05
}

fn default_max_iterations() -> usize {
    2000
}

fn default_x_tolerance() -> f64 {
    1e-10
}

fn default_f_tolerance() -> f64 {
    1e-14
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            kind: FitterKind::default(),
            calibrator: SviCalibratorKind::default(),
            initial_smoothness: default_initial_smoothness(),
            initial_center: 0.0,
            initial_step: default_initial_step(),
            max_iterations: default_max_iterations(),
            x_tolerance: default_x_tolerance(),
            f_tolerance: default_f_tolerance(),
        }
    }
}

impl FitterConfig {
    /// Outer-search configuration derived from this section.
    pub fn nelder_mead(&self) -> NelderMeadConfig {
        NelderMeadConfig::new(self.max_iterations, self.x_tolerance, self.f_tolerance)
            .with_initial_step(self.initial_step)
    }

    /// Append validation errors for this section.
    pub fn collect_errors(&self, errors: &mut Vec<String>) {
        if self.kind == FitterKind::Svi && self.calibrator == SviCalibratorKind::Constrained {
            errors.push("fitter.calibrator 'constrained' is not implemented".to_string());
        }
        if !self.initial_smoothness.is_finite() || !self.initial_center.is_finite() {
            errors.push("fitter.initial_smoothness and fitter.initial_center must be finite".to_string());
        }
        if !(self.initial_step.is_finite() && self.initial_step > 0.0) {
            errors.push(format!(
                "fitter.initial_step must be positive, got {}",
                self.initial_step
            ));
        }
        if self.max_iterations == 0 {
            errors.push("fitter.max_iterations must be at least 1".to_string());
        }
        if self.x_tolerance.is_nan()
            || self.f_tolerance.is_nan()
            || self.x_tolerance <= 0.0
            || self.f_tolerance <= 0.0
        {
            errors.push("fitter tolerances must be positive".to_string());
        }
    }
}

/// Crossed-PnL thresholds for the validation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalIvValidationConfig {
    /// Crossed PnL above which an expiry is escalated to `Warn`.
    #[serde(default = "default_crossed_pnl_warn_threshold")]
    pub crossed_pnl_warn_threshold: f64,

    /// Crossed PnL above which an expiry is escalated to `Fail`.
    #[serde(default = "default_crossed_pnl_fail_threshold")]
    pub crossed_pnl_fail_threshold: f64,
}

fn default_crossed_pnl_warn_threshold() -> f64 {
    100.0
}

fn default_crossed_pnl_fail_threshold() -> f64 {
    1000.0
}

impl Default for FinalIvValidationConfig {
    fn default() -> Self {
        Self {
            crossed_pnl_warn_threshold: default_crossed_pnl_warn_threshold(),
            crossed_pnl_fail_threshold: default_crossed_pnl_fail_threshold(),
        }
    }
}

impl FinalIvValidationConfig {
    /// Append validation errors for this section.
    pub fn collect_errors(&self, errors: &mut Vec<String>) {
        if self.crossed_pnl_warn_threshold.is_nan() || self.crossed_pnl_warn_threshold < 0.0 {
            errors.push(format!(
                "final_iv_validation.crossed_pnl_warn_threshold must be non-negative, got {}",
                self.crossed_pnl_warn_threshold
            ));
        }
        if self.crossed_pnl_fail_threshold.is_nan()
            || self.crossed_pnl_fail_threshold < self.crossed_pnl_warn_threshold
        {
            errors.push(format!(
                "final_iv_validation.crossed_pnl_fail_threshold ({}) must not be below the warn threshold ({})",
                self.crossed_pnl_fail_threshold, self.crossed_pnl_warn_threshold
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of(f: impl FnOnce(&mut Vec<String>)) -> Vec<String> {
        let mut errors = Vec::new();
        f(&mut errors);
        errors
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(errors_of(|e| RawIvFilteringConfig::default().collect_errors(e)).is_empty());
        assert!(errors_of(|e| FitterConfig::default().collect_errors(e)).is_empty());
        assert!(errors_of(|e| FinalIvValidationConfig::default().collect_errors(e)).is_empty());
    }

    #[test]
    fn test_validate_fraction_out_of_range() {
        let config = RawIvFilteringConfig {
            min_valid_strikes_fraction: 1.5,
            ..Default::default()
        };
        let errors = errors_of(|e| config.collect_errors(e));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("min_valid_strikes_fraction"));
    }

    #[test]
    fn test_validate_constrained_calibrator_rejected() {
        let config = FitterConfig {
            calibrator: SviCalibratorKind::Constrained,
            ..Default::default()
        };
        let errors = errors_of(|e| config.collect_errors(e));
        assert!(errors[0].contains("not implemented"));
    }

    #[test]
    fn test_constrained_ignored_for_mid_market() {
        let config = FitterConfig {
            kind: FitterKind::MidMarket,
            calibrator: SviCalibratorKind::Constrained,
            ..Default::default()
        };
        assert!(errors_of(|e| config.collect_errors(e)).is_empty());
    }

    #[test]
    fn test_validate_inverted_thresholds() {
        let config = FinalIvValidationConfig {
            crossed_pnl_warn_threshold: 10.0,
            crossed_pnl_fail_threshold: 5.0,
        };
        let errors = errors_of(|e| config.collect_errors(e));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_nelder_mead_from_fitter_config() {
        let config = FitterConfig {
            max_iterations: 42,
            initial_step: 0.2,
            ..Default::default()
        };
        let nm = config.nelder_mead();
        assert_eq!(nm.max_iterations, 42);
        assert_eq!(nm.initial_step, 0.2);
    }
}
