//! Boundaries between the fit cycle and the outside world.
//!
//! The service only talks to these traits. Sample-data implementations live
//! in [`crate::adapters`]; tests substitute in-memory ones.

use crate::error::ServiceError;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use volfitter_core::types::{FittedSurface, MarketQuote, Pricing};

/// Raw markets for one snapshot, grouped by expiry.
pub type RawMarkets = BTreeMap<NaiveDateTime, Vec<MarketQuote>>;

/// Supplies the time the fitter should treat as "now".
pub trait CurrentTimeSupplier: Send + Sync {
    /// Current time for the next cycle.
    fn now(&self) -> NaiveDateTime;
}

/// Supplies raw implied-volatility markets.
pub trait RawIvSupplier: Send + Sync {
    /// Markets as of `as_of`, at most one quote per (expiry, strike).
    fn raw_markets(&self, as_of: NaiveDateTime) -> Result<RawMarkets, ServiceError>;
}

/// Supplies forward prices.
pub trait ForwardCurveSupplier: Send + Sync {
    /// Forward for every requested expiry.
    ///
    /// # Errors
    ///
    /// Fails if any requested expiry has no forward.
    fn forwards(
        &self,
        as_of: NaiveDateTime,
        expiries: &[NaiveDateTime],
    ) -> Result<BTreeMap<NaiveDateTime, f64>, ServiceError>;
}

/// Supplies per-quote pricing.
pub trait PricingSupplier: Send + Sync {
    /// Pricing for each of `quotes`, in the same order.
    fn pricing(
        &self,
        as_of: NaiveDateTime,
        expiry: NaiveDateTime,
        forward: f64,
        quotes: &[MarketQuote],
    ) -> Result<Vec<Pricing>, ServiceError>;
}

/// Receives each fitted surface.
pub trait FinalIvConsumer: Send + Sync {
    /// Publish a fitted surface.
    fn consume(&self, surface: &FittedSurface) -> Result<(), ServiceError>;
}
