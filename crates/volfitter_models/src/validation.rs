//! Final implied-volatility validation.
//!
//! Validation scores the fitted curve against every raw quote, including the
//! quotes filtering excluded: those markets are still live and a fit that
//! crosses them would lose money.
//!
//! # Crossed PnL
//!
//! ```text
//! crossed(K) = max(bid - fit, 0) + max(fit - ask, 0)
//! pnl        = Σ crossed(K) * vega(K)
//! ```
//!
//! Absent sides, strikes without a fitted point and non-finite vegas
//! contribute nothing.

use crate::config::FinalIvValidationConfig;
use tracing::{debug, warn};
use volfitter_core::types::{FittedCurve, RawCurve, Status};

/// One validation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationCheck {
    /// Escalate on vega-weighted market crossing.
    CrossedPnl {
        /// Escalate to `Warn` strictly above this amount.
        warn_threshold: f64,
        /// Escalate to `Fail` strictly above this amount.
        fail_threshold: f64,
    },
}

impl ValidationCheck {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ValidationCheck::CrossedPnl { .. } => "crossed_pnl",
        }
    }

    /// Apply this check, returning the curve with a possibly escalated status.
    pub fn apply(&self, fitted: FittedCurve, raw: &RawCurve) -> FittedCurve {
        match self {
            ValidationCheck::CrossedPnl {
                warn_threshold,
                fail_threshold,
            } => {
                let pnl = crossed_pnl(&fitted, raw);
                debug!(expiry = %fitted.expiry, crossed_pnl = pnl, "Crossed PnL");

                if pnl > *fail_threshold {
                    fitted.escalated(Status::fail(format!(
                        "Crossed PnL: {:.2} > {}",
                        pnl, fail_threshold
                    )))
                } else if pnl > *warn_threshold {
                    fitted.escalated(Status::warn(format!(
                        "Crossed PnL: {:.2} > {}",
                        pnl, warn_threshold
                    )))
                } else {
                    fitted
                }
            }
        }
    }
}

/// Vega-weighted amount by which `fitted` lies outside the raw markets.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use volfitter_core::types::*;
/// use volfitter_models::validation::crossed_pnl;
///
/// let expiry = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap().and_hms_opt(15, 0, 0).unwrap();
/// let quote = Quote::new(
///     MarketQuote { strike: 100.0, kind: OptionKind::Call, bid_vol: Some(0.20),
///                   ask_vol: Some(0.22), last_trade_date: None },
///     Pricing { moneyness: Moneyness::Otm, vega: 50.0 },
/// );
/// let raw = RawCurve::new(expiry, 100.0, 0.5, vec![quote]).unwrap();
///
/// let mut fitted = FittedCurve::unfitted(expiry, Status::ok());
/// fitted.points.push(FittedPoint { strike: 100.0, log_moneyness: 0.0, total_variance: 0.0, vol: 0.24 });
///
/// assert!((crossed_pnl(&fitted, &raw) - 1.0).abs() < 1e-12);
/// ```
pub fn crossed_pnl(fitted: &FittedCurve, raw: &RawCurve) -> f64 {
    raw.quotes()
        .iter()
        .filter_map(|q| {
            let fit = fitted.vol_at(q.strike()).filter(|v| v.is_finite())?;
            let vega = Some(q.vega()).filter(|v| v.is_finite())?;

            let below_bid = q.bid_vol().map_or(0.0, |bid| (bid - fit).max(0.0));
            let above_ask = q.ask_vol().map_or(0.0, |ask| (fit - ask).max(0.0));
            Some((below_bid + above_ask) * vega)
        })
        .sum()
}

/// Ordered composition of validation checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationEngine {
    checks: Vec<ValidationCheck>,
}

impl ValidationEngine {
    /// Create an engine running `checks` in order.
    pub fn new(checks: Vec<ValidationCheck>) -> Self {
        Self { checks }
    }

    /// The standard validation sequence parameterised by `config`.
    pub fn from_config(config: &FinalIvValidationConfig) -> Self {
        Self::new(vec![ValidationCheck::CrossedPnl {
            warn_threshold: config.crossed_pnl_warn_threshold,
            fail_threshold: config.crossed_pnl_fail_threshold,
        }])
    }

    /// Checks in application order.
    pub fn checks(&self) -> &[ValidationCheck] {
        &self.checks
    }

    /// Validate `fitted` against the full raw curve.
    ///
    /// A curve that has already failed is returned unchanged.
    pub fn validate(&self, fitted: FittedCurve, raw: &RawCurve) -> FittedCurve {
        if fitted.status.is_fail() {
            return fitted;
        }

        let mut fitted = fitted;
        for check in &self.checks {
            let before = fitted.status.tag();
            fitted = check.apply(fitted, raw);
            if fitted.status.tag() > before {
                warn!(
                    expiry = %fitted.expiry,
                    check = check.name(),
                    tag = %fitted.status.tag(),
                    message = fitted.status.message(),
                    "Expiry status escalated by validation"
                );
            }
        }
        fitted
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::from_config(&FinalIvValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use volfitter_core::types::{FittedPoint, MarketQuote, Moneyness, OptionKind, Pricing, Quote, Tag};

    fn expiry() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 21)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn quote(strike: f64, bid: Option<f64>, ask: Option<f64>, vega: f64) -> Quote {
        Quote::new(
            MarketQuote {
                strike,
                kind: OptionKind::Call,
                bid_vol: bid,
                ask_vol: ask,
                last_trade_date: None,
            },
            Pricing {
                moneyness: Moneyness::Otm,
                vega,
            },
        )
    }

    fn raw() -> RawCurve {
        RawCurve::new(
            expiry(),
            105.0,
            0.5,
            vec![
                quote(100.0, Some(9.0), Some(10.0), 1.1),
                quote(110.0, None, Some(11.0), 2.2),
            ],
        )
        .unwrap()
    }

    fn fitted(vols: &[(f64, f64)], status: Status) -> FittedCurve {
        let mut curve = FittedCurve::unfitted(expiry(), status);
        for &(strike, vol) in vols {
            curve.points.push(FittedPoint {
                strike,
                log_moneyness: (strike / 105.0_f64).ln(),
                total_variance: vol * vol * 0.5,
                vol,
            });
        }
        curve
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::new(vec![ValidationCheck::CrossedPnl {
            warn_threshold: 1.0,
            fail_threshold: 2.0,
        }])
    }

    #[test]
    fn test_crossed_pnl_above_fail_threshold() {
        let result = engine().validate(fitted(&[(100.0, 11.0), (110.0, 12.0)], Status::ok()), &raw());
        assert_eq!(result.status.tag(), Tag::Fail);
        assert_eq!(result.status.message(), "Crossed PnL: 3.30 > 2");
    }

    #[test]
    fn test_crossed_pnl_between_thresholds_warns() {
        let result = engine().validate(fitted(&[(100.0, 11.0), (110.0, 8.0)], Status::ok()), &raw());
        assert_eq!(result.status.tag(), Tag::Warn);
        assert!(result.status.message().contains("Crossed PnL: 1.10 > 1"));
    }

    #[test]
    fn test_crossed_pnl_below_warn_threshold_unchanged() {
        let input = fitted(&[(100.0, 10.5), (110.0, 8.0)], Status::ok());
        let result = engine().validate(input.clone(), &raw());
        assert_eq!(result, input);
    }

    #[test]
    fn test_failed_curve_is_skipped() {
        let input = fitted(&[(100.0, 50.0), (110.0, 50.0)], Status::fail("Expired."));
        let result = engine().validate(input.clone(), &raw());
        assert_eq!(result, input);
    }

    #[test]
    fn test_warn_curve_can_escalate_to_fail() {
        let input = fitted(&[(100.0, 11.0), (110.0, 12.0)], Status::warn("earlier"));
        let result = engine().validate(input, &raw());
        assert_eq!(result.status.tag(), Tag::Fail);
    }

    #[test]
    fn test_warn_not_replaced_by_equal_warn() {
        let input = fitted(&[(100.0, 11.0), (110.0, 8.0)], Status::warn("earlier"));
        let result = engine().validate(input, &raw());
        assert_eq!(result.status, Status::warn("earlier"));
    }

    #[test]
    fn test_strike_without_fit_contributes_nothing() {
        let pnl = crossed_pnl(&fitted(&[(110.0, 12.0)], Status::ok()), &raw());
        assert_relative_eq!(pnl, 2.2, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_vega_contributes_nothing() {
        let raw = RawCurve::new(
            expiry(),
            105.0,
            0.5,
            vec![quote(100.0, Some(9.0), Some(10.0), f64::NAN)],
        )
        .unwrap();
        let pnl = crossed_pnl(&fitted(&[(100.0, 20.0)], Status::ok()), &raw);
        assert_eq!(pnl, 0.0);
    }

    #[test]
    fn test_below_bid_counts() {
        let pnl = crossed_pnl(&fitted(&[(100.0, 8.0)], Status::ok()), &raw());
        assert_relative_eq!(pnl, 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_exactly_at_threshold_does_not_escalate() {
        // 1.0 * vega 1.0 == warn threshold
        let raw = RawCurve::new(
            expiry(),
            105.0,
            0.5,
            vec![quote(100.0, Some(9.0), Some(10.0), 1.0)],
        )
        .unwrap();
        let result = engine().validate(fitted(&[(100.0, 11.0)], Status::ok()), &raw);
        assert!(result.status.is_ok());
    }
}
