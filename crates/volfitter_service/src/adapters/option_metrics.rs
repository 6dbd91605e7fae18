//! OptionMetrics-style CSV rows and field conversions.
//!
//! Dates are `YYYYMMDD` integers and strikes are quoted multiplied by 1000.
//! An expiry settles at 08:30 when `am_settlement` is 1 and 15:00 when it is 0.

use crate::error::ServiceError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use volfitter_core::types::OptionKind;

/// Snapshot time used for every sample date (market close).
pub const SNAPSHOT_HOUR: u32 = 15;

/// A row that belongs to one snapshot date.
pub trait DatedRow {
    /// Snapshot date as `YYYYMMDD`.
    fn date(&self) -> u32;
}

/// One option row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionRow {
    /// Snapshot date
    pub date: u32,
    /// Expiry date
    pub exdate: u32,
    /// 1 for AM settlement, 0 for PM
    pub am_settlement: u8,
    /// Strike × 1000
    pub strike_price: f64,
    /// `C` or `P`
    pub cp_flag: String,
    /// Best bid price
    pub best_bid: Option<f64>,
    /// Best offer price
    pub best_offer: Option<f64>,
    /// Mid implied volatility
    pub impl_volatility: Option<f64>,
    /// Vega per unit vol
    pub vega: Option<f64>,
    /// Last trade date
    #[serde(default)]
    pub last_date: Option<u32>,
}

impl DatedRow for OptionRow {
    fn date(&self) -> u32 {
        self.date
    }
}

impl OptionRow {
    /// Expiry timestamp.
    pub fn expiry(&self) -> Result<NaiveDateTime, ServiceError> {
        expiry_from(self.exdate, self.am_settlement)
    }

    /// Strike price.
    pub fn strike(&self) -> f64 {
        self.strike_price / 1000.0
    }

    /// Integer strike key, exact for strikes quoted to 1/1000.
    pub fn strike_key(&self) -> i64 {
        self.strike_price.round() as i64
    }

    /// Call or put.
    pub fn kind(&self) -> Result<OptionKind, ServiceError> {
        match self.cp_flag.trim() {
            "C" => Ok(OptionKind::Call),
            "P" => Ok(OptionKind::Put),
            other => Err(ServiceError::data(format!("Unsupported cp_flag: '{}'", other))),
        }
    }

    /// Last trade date, if any.
    pub fn last_trade_date(&self) -> Result<Option<NaiveDate>, ServiceError> {
        self.last_date.map(parse_yyyymmdd).transpose()
    }

    /// Approximate bid and ask vols from the price market.
    ///
    /// The price width divided by vega gives the vol width, centred on the
    /// mid vol. A side is absent if it is not finite; the bid is also absent
    /// if it is not positive.
    pub fn vol_market(&self) -> (Option<f64>, Option<f64>) {
        let (Some(bid), Some(ask), Some(mid), Some(vega)) =
            (self.best_bid, self.best_offer, self.impl_volatility, self.vega)
        else {
            return (None, None);
        };

        let half_width = 0.5 * (ask - bid) / vega;
        let bid_vol = Some(mid - half_width).filter(|v| v.is_finite() && *v > 0.0);
        let ask_vol = Some(mid + half_width).filter(|v| v.is_finite());
        (bid_vol, ask_vol)
    }
}

/// One forward row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForwardRow {
    /// Snapshot date
    pub date: u32,
    /// Expiry date
    pub expiration: u32,
    /// 1 for AM settlement, 0 for PM
    #[serde(rename = "AMSettlement")]
    pub am_settlement: u8,
    /// Forward price
    #[serde(rename = "ForwardPrice")]
    pub forward_price: f64,
}

impl DatedRow for ForwardRow {
    fn date(&self) -> u32 {
        self.date
    }
}

impl ForwardRow {
    /// Expiry timestamp.
    pub fn expiry(&self) -> Result<NaiveDateTime, ServiceError> {
        expiry_from(self.expiration, self.am_settlement)
    }
}

/// Parse a `YYYYMMDD` integer.
pub fn parse_yyyymmdd(value: u32) -> Result<NaiveDate, ServiceError> {
    NaiveDate::from_ymd_opt((value / 10_000) as i32, (value / 100) % 100, value % 100)
        .ok_or_else(|| ServiceError::data(format!("Invalid date: {}", value)))
}

/// Format a date as a `YYYYMMDD` integer.
pub fn to_yyyymmdd(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

/// Expiry timestamp from its date and settlement flag.
pub fn expiry_from(date: u32, am_settlement: u8) -> Result<NaiveDateTime, ServiceError> {
    let (hour, minute) = match am_settlement {
        1 => (8, 30),
        0 => (15, 0),
        other => {
            return Err(ServiceError::data(format!(
                "Unsupported am_settlement: {}",
                other
            )))
        }
    };
    parse_yyyymmdd(date)?
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| ServiceError::data(format!("Invalid expiry time for {}", date)))
}
