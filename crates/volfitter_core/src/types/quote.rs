//! Per-strike market quotes and pricing metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl OptionKind {
    /// Classify a strike by its log-moneyness `ln(K / F)`.
    ///
    /// Calls are in the money below the forward, puts above it. A strike at
    /// the forward is out of the money for both.
    ///
    /// # Examples
    /// ```
    /// use volfitter_core::types::{Moneyness, OptionKind};
    ///
    /// assert_eq!(OptionKind::Call.moneyness(-0.1), Moneyness::Itm);
    /// assert_eq!(OptionKind::Put.moneyness(-0.1), Moneyness::Otm);
    /// assert_eq!(OptionKind::Put.moneyness(0.0), Moneyness::Otm);
    /// ```
    pub fn moneyness(self, log_moneyness: f64) -> Moneyness {
        let itm = match self {
            OptionKind::Call => log_moneyness < 0.0,
            OptionKind::Put => log_moneyness > 0.0,
        };
        if itm {
            Moneyness::Itm
        } else {
            Moneyness::Otm
        }
    }
}

/// In-the-money / out-of-the-money flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Moneyness {
    /// In the money.
    Itm,
    /// Out of the money (including at the money).
    Otm,
}

/// One strike's two-sided implied-volatility market, as sourced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Strike price.
    pub strike: f64,
    /// Option type the market was quoted on.
    pub kind: OptionKind,
    /// Bid implied volatility, if quoted.
    pub bid_vol: Option<f64>,
    /// Ask implied volatility, if quoted.
    pub ask_vol: Option<f64>,
    /// Date of the most recent trade, if any.
    pub last_trade_date: Option<NaiveDate>,
}

impl MarketQuote {
    /// Both sides present.
    #[inline]
    pub fn is_two_sided(&self) -> bool {
        self.bid_vol.is_some() && self.ask_vol.is_some()
    }

    /// Mid vol, when both sides are present.
    pub fn mid_vol(&self) -> Option<f64> {
        Some(0.5 * (self.bid_vol? + self.ask_vol?))
    }

    /// Ask minus bid, when both sides are present.
    pub fn width(&self) -> Option<f64> {
        Some(self.ask_vol? - self.bid_vol?)
    }
}

/// Pricing metadata for a single quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// ITM / OTM relative to the forward.
    pub moneyness: Moneyness,
    /// Vega in price units per vol point.
    pub vega: f64,
}

/// A market quote joined with its pricing metadata.
///
/// Immutable once built: stages record exclusions alongside the quote rather
/// than altering it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// The sourced market.
    pub market: MarketQuote,
    /// Moneyness and vega.
    pub pricing: Pricing,
}

impl Quote {
    /// Join a market quote with its pricing.
    pub fn new(market: MarketQuote, pricing: Pricing) -> Self {
        Self { market, pricing }
    }

    /// Strike price.
    #[inline]
    pub fn strike(&self) -> f64 {
        self.market.strike
    }

    /// Bid implied volatility.
    #[inline]
    pub fn bid_vol(&self) -> Option<f64> {
        self.market.bid_vol
    }

    /// Ask implied volatility.
    #[inline]
    pub fn ask_vol(&self) -> Option<f64> {
        self.market.ask_vol
    }

    /// Vega.
    #[inline]
    pub fn vega(&self) -> f64 {
        self.pricing.vega
    }

    /// Returns `true` if the quote is in the money.
    #[inline]
    pub fn is_itm(&self) -> bool {
        self.pricing.moneyness == Moneyness::Itm
    }
}
