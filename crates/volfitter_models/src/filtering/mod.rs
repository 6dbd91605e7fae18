//! Raw implied-volatility filtering.
//!
//! A [`FilterEngine`] is an ordered list of [`FilterCheck`]s. Each check may
//! exclude quotes and/or escalate the curve status. Every check runs even
//! after the curve has failed, so exclusions stay accurate for downstream
//! consumers.
//!
//! # Standard check order
//!
//! ```text
//! ExpiredExpiry → InTheMoney → NonTwoSidedMarket → StaleLastTrade
//!               → WideMarket → InsufficientValidStrikes
//! ```
//!
//! Exclusion checks come first; the strike-count check sees their result.
//!
//! # Example
//!
//! ```
//! use volfitter_models::config::RawIvFilteringConfig;
//! use volfitter_models::filtering::FilterEngine;
//!
//! let engine = FilterEngine::from_config(&RawIvFilteringConfig::default());
//! assert_eq!(engine.checks().len(), 6);
//! ```

mod checks;

use crate::config::RawIvFilteringConfig;
use chrono::NaiveDate;
use tracing::{debug, warn};
use volfitter_core::types::{FilteredCurve, RawCurve};

pub use checks::{EXPIRED_MESSAGE, INSUFFICIENT_STRIKES_MESSAGE, MIN_VALID_STRIKES, WIDE_MARKET_TOLERANCE};

/// One filtering rule.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCheck {
    /// Fail the curve if time to expiry is not positive.
    ExpiredExpiry,
    /// Exclude in-the-money quotes.
    InTheMoney,
    /// Exclude quotes missing a bid or an ask.
    NonTwoSidedMarket,
    /// Exclude quotes with no last trade or one older than the limit.
    StaleLastTrade {
        /// Maximum age in business days.
        max_age_business_days: i64,
    },
    /// Exclude quotes wider than `median + mad_threshold * MAD`.
    WideMarket {
        /// MAD multiplier.
        mad_threshold: f64,
    },
    /// Fail the curve if too few quotes survive.
    InsufficientValidStrikes {
        /// Minimum surviving share of the originally listed strikes.
        min_fraction: f64,
    },
}

impl FilterCheck {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            FilterCheck::ExpiredExpiry => "expired_expiry",
            FilterCheck::InTheMoney => "in_the_money",
            FilterCheck::NonTwoSidedMarket => "non_two_sided_market",
            FilterCheck::StaleLastTrade { .. } => "stale_last_trade",
            FilterCheck::WideMarket { .. } => "wide_market",
            FilterCheck::InsufficientValidStrikes { .. } => "insufficient_valid_strikes",
        }
    }

    /// Apply this check, returning the updated curve.
    pub fn apply(&self, curve: FilteredCurve, as_of: NaiveDate) -> FilteredCurve {
        match self {
            FilterCheck::ExpiredExpiry => checks::expired_expiry(curve),
            FilterCheck::InTheMoney => checks::in_the_money(curve),
            FilterCheck::NonTwoSidedMarket => checks::non_two_sided_market(curve),
            FilterCheck::StaleLastTrade {
                max_age_business_days,
            } => checks::stale_last_trade(curve, as_of, *max_age_business_days),
            FilterCheck::WideMarket { mad_threshold } => checks::wide_market(curve, *mad_threshold),
            FilterCheck::InsufficientValidStrikes { min_fraction } => {
                checks::insufficient_valid_strikes(curve, *min_fraction)
            }
        }
    }
}

/// Ordered composition of filter checks.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEngine {
    checks: Vec<FilterCheck>,
}

impl FilterEngine {
    /// Create an engine running `checks` in the given order.
    pub fn new(checks: Vec<FilterCheck>) -> Self {
        Self { checks }
    }

    /// The standard check sequence parameterised by `config`.
    pub fn from_config(config: &RawIvFilteringConfig) -> Self {
        Self::new(vec![
            FilterCheck::ExpiredExpiry,
            FilterCheck::InTheMoney,
            FilterCheck::NonTwoSidedMarket,
            FilterCheck::StaleLastTrade {
                max_age_business_days: config.max_last_trade_age_days,
            },
            FilterCheck::WideMarket {
                mad_threshold: config.wide_market_outlier_mad_threshold,
            },
            FilterCheck::InsufficientValidStrikes {
                min_fraction: config.min_valid_strikes_fraction,
            },
        ])
    }

    /// Checks in application order.
    pub fn checks(&self) -> &[FilterCheck] {
        &self.checks
    }

    /// Filter one curve as of `as_of`.
    pub fn filter(&self, raw: RawCurve, as_of: NaiveDate) -> FilteredCurve {
        let expiry = raw.expiry();
        let listed = raw.len();

        let mut curve = FilteredCurve::new(raw);
        for check in &self.checks {
            let before_count = curve.included_count();
            let before_tag = curve.status().tag();

            curve = check.apply(curve, as_of);

            let excluded = before_count.saturating_sub(curve.included_count());
            if excluded > 0 {
                debug!(%expiry, check = check.name(), excluded, "Quotes excluded");
            }
            if curve.status().tag() > before_tag {
                warn!(
                    %expiry,
                    check = check.name(),
                    tag = %curve.status().tag(),
                    message = curve.status().message(),
                    "Expiry status escalated by filter"
                );
            }
        }

        debug!(
            %expiry,
            listed,
            included = curve.included_count(),
            tag = %curve.status().tag(),
            "Filtered curve"
        );
        curve
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::from_config(&RawIvFilteringConfig::default())
    }
}

