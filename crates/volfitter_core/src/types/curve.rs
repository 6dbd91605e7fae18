//! Per-expiry curves: the unit of work of a fit cycle.
//!
//! A cycle turns each [`RawCurve`] into a [`FilteredCurve`], then a
//! [`FittedCurve`]. Each stage consumes its input and produces a fresh value;
//! nothing is shared between expiries.

use super::error::CurveError;
use super::quote::Quote;
use super::status::{Status, Tag};
use super::svi::SviParameters;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All quotes for one `(symbol, expiry)` pair, ordered by strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCurve {
    expiry: NaiveDateTime,
    forward: f64,
    time_to_expiry: f64,
    quotes: Vec<Quote>,
}

impl RawCurve {
    /// Build a curve, sorting quotes by strike.
    ///
    /// # Errors
    ///
    /// - `CurveError::InvalidForward` if `forward` is not a positive finite number
    /// - `CurveError::InvalidStrike` if any strike is not a positive finite number
    /// - `CurveError::DuplicateStrike` if two quotes share a strike
    /// - `CurveError::NonFiniteTimeToExpiry` if `time_to_expiry` is NaN or infinite
    ///
    /// A non-positive time to expiry is accepted; the expiry check flags it.
    pub fn new(
        expiry: NaiveDateTime,
        forward: f64,
        time_to_expiry: f64,
        mut quotes: Vec<Quote>,
    ) -> Result<Self, CurveError> {
        if !(forward.is_finite() && forward > 0.0) {
            return Err(CurveError::InvalidForward { forward });
        }
        if !time_to_expiry.is_finite() {
            return Err(CurveError::NonFiniteTimeToExpiry { time_to_expiry });
        }
        if let Some(q) = quotes
            .iter()
            .find(|q| !(q.strike().is_finite() && q.strike() > 0.0))
        {
            return Err(CurveError::InvalidStrike { strike: q.strike() });
        }

        quotes.sort_by(|a, b| a.strike().total_cmp(&b.strike()));
        if let Some(pair) = quotes.windows(2).find(|w| w[0].strike() == w[1].strike()) {
            return Err(CurveError::DuplicateStrike {
                strike: pair[0].strike(),
            });
        }

        Ok(Self {
            expiry,
            forward,
            time_to_expiry,
            quotes,
        })
    }

    /// Expiry timestamp.
    #[inline]
    pub fn expiry(&self) -> NaiveDateTime {
        self.expiry
    }

    /// Forward price for the expiry.
    #[inline]
    pub fn forward(&self) -> f64 {
        self.forward
    }

    /// Time to expiry in years (ACT/365).
    #[inline]
    pub fn time_to_expiry(&self) -> f64 {
        self.time_to_expiry
    }

    /// Quotes in ascending strike order.
    #[inline]
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Number of listed strikes.
    #[inline]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Returns `true` if the curve has no quotes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Log-moneyness `ln(K / F)` of a strike.
    #[inline]
    pub fn log_moneyness(&self, strike: f64) -> f64 {
        (strike / self.forward).ln()
    }
}

/// A raw curve with per-quote inclusion flags and an expiry status.
///
/// Excluded quotes are kept: validation scores the fit against every quote.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredCurve {
    raw: RawCurve,
    included: Vec<bool>,
    status: Status,
}

impl FilteredCurve {
    /// Every quote included, status `Ok`.
    pub fn new(raw: RawCurve) -> Self {
        let included = vec![true; raw.len()];
        Self {
            raw,
            included,
            status: Status::ok(),
        }
    }

    /// The underlying raw curve.
    #[inline]
    pub fn raw(&self) -> &RawCurve {
        &self.raw
    }

    /// Take back the raw curve.
    pub fn into_raw(self) -> RawCurve {
        self.raw
    }

    /// Current status.
    #[inline]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Inclusion flags, aligned with `raw().quotes()`.
    #[inline]
    pub fn inclusion(&self) -> &[bool] {
        &self.included
    }

    /// Whether quote `index` is still included.
    #[inline]
    pub fn is_included(&self, index: usize) -> bool {
        self.included.get(index).copied().unwrap_or(false)
    }

    /// Included quotes in strike order.
    pub fn included_quotes(&self) -> impl Iterator<Item = &Quote> + '_ {
        self.raw
            .quotes()
            .iter()
            .zip(&self.included)
            .filter_map(|(q, &inc)| inc.then_some(q))
    }

    /// Indices and quotes of included quotes.
    pub fn included_indexed(&self) -> impl Iterator<Item = (usize, &Quote)> + '_ {
        self.raw
            .quotes()
            .iter()
            .enumerate()
            .filter(move |(i, _)| self.included[*i])
    }

    /// Number of included quotes.
    pub fn included_count(&self) -> usize {
        self.included.iter().filter(|&&inc| inc).count()
    }

    /// Mark quote `index` as excluded. Exclusion is permanent.
    pub fn exclude(&mut self, index: usize) {
        if let Some(flag) = self.included.get_mut(index) {
            *flag = false;
        }
    }

    /// Escalate the status; a less severe status is ignored.
    pub fn escalate(&mut self, status: Status) {
        let current = std::mem::take(&mut self.status);
        self.status = current.escalate(status);
    }
}

/// One fitted strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedPoint {
    /// Strike price.
    pub strike: f64,
    /// `ln(K / F)`.
    pub log_moneyness: f64,
    /// Fitted total variance `vol^2 * t`.
    pub total_variance: f64,
    /// Fitted implied volatility.
    pub vol: f64,
}

/// Summary of a calibration run, attached to a fitted curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Outer-search iterations used.
    pub iterations: usize,
    /// Objective evaluations (inner regressions) performed.
    pub evaluations: usize,
    /// Sum of squared total-variance residuals at the optimum.
    pub residual_sum_of_squares: f64,
    /// Root-mean-square total-variance residual.
    pub rmse: f64,
    /// Whether the outer search met its tolerances.
    pub converged: bool,
}

/// Fit result for one expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    /// Expiry timestamp.
    pub expiry: NaiveDateTime,
    /// Status after fitting (and, later, validation).
    pub status: Status,
    /// Fitted points in ascending strike order. Empty when no fit was attempted.
    pub points: Vec<FittedPoint>,
    /// Model parameters, `None` when no parametric fit was produced.
    pub parameters: Option<SviParameters>,
    /// Calibration diagnostics, when a calibration ran.
    pub diagnostics: Option<FitDiagnostics>,
}

impl FittedCurve {
    /// A curve with no fit, carrying `status` unchanged.
    pub fn unfitted(expiry: NaiveDateTime, status: Status) -> Self {
        Self {
            expiry,
            status,
            points: Vec::new(),
            parameters: None,
            diagnostics: None,
        }
    }

    /// The fitted point at exactly `strike`, if any.
    pub fn point_at(&self, strike: f64) -> Option<&FittedPoint> {
        self.points
            .binary_search_by(|p| p.strike.total_cmp(&strike))
            .ok()
            .map(|i| &self.points[i])
    }

    /// Fitted vol at exactly `strike`, if any.
    pub fn vol_at(&self, strike: f64) -> Option<f64> {
        self.point_at(strike).map(|p| p.vol)
    }

    /// Escalate the status; a less severe status is ignored.
    #[must_use]
    pub fn escalated(mut self, status: Status) -> Self {
        let current = std::mem::take(&mut self.status);
        self.status = current.escalate(status);
        self
    }
}

/// All fitted curves for one symbol at one as-of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedSurface {
    /// Underlying symbol.
    pub symbol: String,
    /// Market snapshot time.
    pub as_of: NaiveDateTime,
    /// Fitted curves keyed by expiry.
    pub curves: BTreeMap<NaiveDateTime, FittedCurve>,
}

impl FittedSurface {
    /// Number of expiries at each tag, in `Ok`, `Warn`, `Fail` order.
    pub fn tag_counts(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for curve in self.curves.values() {
            let slot = match curve.status.tag() {
                Tag::Ok => 0,
                Tag::Warn => 1,
                Tag::Fail => 2,
            };
            counts[slot] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::quote::{MarketQuote, Moneyness, OptionKind, Pricing};
    use chrono::NaiveDate;

    fn expiry() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn quote(strike: f64) -> Quote {
        Quote::new(
            MarketQuote {
                strike,
                kind: OptionKind::Put,
                bid_vol: Some(0.2),
                ask_vol: Some(0.22),
                last_trade_date: None,
            },
            Pricing {
                moneyness: Moneyness::Otm,
                vega: 1.0,
            },
        )
    }

    #[test]
    fn test_raw_curve_sorts_by_strike() {
        let curve =
            RawCurve::new(expiry(), 100.0, 0.5, vec![quote(110.0), quote(90.0), quote(100.0)])
                .unwrap();
        let strikes: Vec<f64> = curve.quotes().iter().map(|q| q.strike()).collect();
        assert_eq!(strikes, vec![90.0, 100.0, 110.0]);
    }

    #[test]
    fn test_raw_curve_rejects_duplicate_strike() {
        let err = RawCurve::new(expiry(), 100.0, 0.5, vec![quote(100.0), quote(100.0)])
            .unwrap_err();
        assert_eq!(err, CurveError::DuplicateStrike { strike: 100.0 });
    }

    #[test]
    fn test_raw_curve_rejects_bad_forward() {
        assert!(matches!(
            RawCurve::new(expiry(), 0.0, 0.5, vec![]),
            Err(CurveError::InvalidForward { .. })
        ));
        assert!(matches!(
            RawCurve::new(expiry(), f64::NAN, 0.5, vec![]),
            Err(CurveError::InvalidForward { .. })
        ));
    }

    #[test]
    fn test_raw_curve_accepts_expired() {
        assert!(RawCurve::new(expiry(), 100.0, -0.1, vec![quote(100.0)]).is_ok());
    }

    #[test]
    fn test_filtered_curve_exclusion() {
        let raw = RawCurve::new(expiry(), 100.0, 0.5, vec![quote(90.0), quote(100.0)]).unwrap();
        let mut filtered = FilteredCurve::new(raw);
        assert_eq!(filtered.included_count(), 2);

        filtered.exclude(0);
        assert_eq!(filtered.included_count(), 1);
        assert!(!filtered.is_included(0));
        assert_eq!(filtered.included_quotes().next().unwrap().strike(), 100.0);
        assert_eq!(filtered.raw().len(), 2);
    }

    #[test]
    fn test_filtered_curve_escalate_is_monotone() {
        let raw = RawCurve::new(expiry(), 100.0, 0.5, vec![]).unwrap();
        let mut filtered = FilteredCurve::new(raw);
        filtered.escalate(Status::fail("Expired."));
        filtered.escalate(Status::warn("later"));
        assert_eq!(filtered.status(), &Status::fail("Expired."));
    }

    #[test]
    fn test_point_lookup() {
        let mut curve = FittedCurve::unfitted(expiry(), Status::ok());
        for strike in [90.0, 100.0, 110.0] {
            curve.points.push(FittedPoint {
                strike,
                log_moneyness: (strike / 100.0_f64).ln(),
                total_variance: 0.04,
                vol: 0.2,
            });
        }
        assert_eq!(curve.vol_at(100.0), Some(0.2));
        assert_eq!(curve.vol_at(105.0), None);
    }

    #[test]
    fn test_surface_json_round_trip_keys() {
        let mut curves = BTreeMap::new();
        curves.insert(expiry(), FittedCurve::unfitted(expiry(), Status::warn("w")));
        let surface = FittedSurface {
            symbol: "AMZN".to_string(),
            as_of: expiry(),
            curves,
        };
        let json = serde_json::to_string(&surface).unwrap();
        let back: FittedSurface = serde_json::from_str(&json).unwrap();
        assert_eq!(back, surface);
        assert_eq!(back.tag_counts(), [0, 1, 0]);
    }
}
