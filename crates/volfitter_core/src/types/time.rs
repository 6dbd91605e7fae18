//! Calendar helpers.
//!
//! - [`business_days_between`]: weekday count over a half-open date range
//! - [`year_fraction_act365`]: exact ACT/365 year fraction between timestamps
//!
//! No holiday calendar is applied; only Saturdays and Sundays are skipped.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

/// Seconds in a 365-day year.
const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0;

/// Returns `true` for Saturday and Sunday.
#[inline]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Returns `true` for Monday to Friday.
#[inline]
pub fn is_business_day(date: NaiveDate) -> bool {
    !is_weekend(date)
}

/// Number of business days in `[start, end)`.
///
/// If `end` precedes `start` the count over `[end, start)` is returned
/// negated, so the result is antisymmetric in its arguments.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use volfitter_core::types::business_days_between;
///
/// let fri = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// let mon = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
/// assert_eq!(business_days_between(fri, mon), 1);
/// assert_eq!(business_days_between(mon, fri), -1);
/// ```
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return -business_days_between(end, start);
    }

    let total_days = (end - start).num_days();
    let full_weeks = total_days / 7;
    let mut count = full_weeks * 5;

    let mut date = start + chrono::Duration::days(full_weeks * 7);
    while date < end {
        if is_business_day(date) {
            count += 1;
        }
        date = date.succ_opt().unwrap_or(end);
    }
    count
}

/// ACT/365 year fraction from `start` to `end`, negative if `end` is earlier.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use volfitter_core::types::year_fraction_act365;
///
/// let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(15, 0, 0).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(15, 0, 0).unwrap();
/// assert!((year_fraction_act365(start, end) - 1.0).abs() < 1e-12);
/// ```
pub fn year_fraction_act365(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let millis = (end - start).num_milliseconds();
    millis as f64 / 1000.0 / SECONDS_PER_YEAR
}
