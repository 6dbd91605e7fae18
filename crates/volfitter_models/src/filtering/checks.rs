//! Individual filter checks.

use chrono::NaiveDate;
use volfitter_core::math::stats::median_and_mad;
use volfitter_core::types::{business_days_between, FilteredCurve, Quote, Status};

/// Fewest surviving quotes a curve may have.
pub const MIN_VALID_STRIKES: usize = 3;

/// Absolute slack on the wide-market limit so rounding noise in otherwise
/// equal widths never excludes a quote.
pub const WIDE_MARKET_TOLERANCE: f64 = 1e-12;

/// Status message for an expiry at or past its expiration.
pub const EXPIRED_MESSAGE: &str = "Expired.";

/// Status message for a curve left with too few quotes.
pub const INSUFFICIENT_STRIKES_MESSAGE: &str = "Insufficient valid strikes.";

fn exclude_where(curve: &mut FilteredCurve, predicate: impl Fn(&Quote) -> bool) {
    let doomed: Vec<usize> = curve
        .included_indexed()
        .filter(|&(_, q)| predicate(q))
        .map(|(i, _)| i)
        .collect();
    for index in doomed {
        curve.exclude(index);
    }
}

pub(super) fn expired_expiry(mut curve: FilteredCurve) -> FilteredCurve {
    if curve.raw().time_to_expiry() <= 0.0 {
        curve.escalate(Status::fail(EXPIRED_MESSAGE));
    }
    curve
}

pub(super) fn in_the_money(mut curve: FilteredCurve) -> FilteredCurve {
    exclude_where(&mut curve, Quote::is_itm);
    curve
}

pub(super) fn non_two_sided_market(mut curve: FilteredCurve) -> FilteredCurve {
    exclude_where(&mut curve, |q| !q.market.is_two_sided());
    curve
}

pub(super) fn stale_last_trade(
    mut curve: FilteredCurve,
    as_of: NaiveDate,
    max_age_business_days: i64,
) -> FilteredCurve {
    exclude_where(&mut curve, |q| match q.market.last_trade_date {
        Some(last) => business_days_between(last, as_of) > max_age_business_days,
        None => true,
    });
    curve
}

pub(super) fn wide_market(mut curve: FilteredCurve, mad_threshold: f64) -> FilteredCurve {
    let widths: Vec<(usize, f64)> = curve
        .included_indexed()
        .filter_map(|(i, q)| q.market.width().map(|w| (i, w)))
        .collect();
    if widths.len() < 2 {
        return curve;
    }

    let values: Vec<f64> = widths.iter().map(|&(_, w)| w).collect();
    let Some((median, mad)) = median_and_mad(&values) else {
        return curve;
    };
    let limit = median + mad_threshold * mad + WIDE_MARKET_TOLERANCE;

    for (index, width) in widths {
        if width > limit {
            curve.exclude(index);
        }
    }
    curve
}

pub(super) fn insufficient_valid_strikes(mut curve: FilteredCurve, min_fraction: f64) -> FilteredCurve {
    let remaining = curve.included_count();
    let original = curve.raw().len();

    if remaining < MIN_VALID_STRIKES || (remaining as f64 / original as f64) < min_fraction {
        curve.escalate(Status::fail(INSUFFICIENT_STRIKES_MESSAGE));
    }
    curve
}
