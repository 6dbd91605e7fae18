//! Raw IV, forward and pricing suppliers over sample CSV data.

use super::option_metrics::{ForwardRow, OptionRow};
use super::sample_data::SampleCsvSource;
use crate::error::ServiceError;
use crate::ports::{ForwardCurveSupplier, PricingSupplier, RawIvSupplier, RawMarkets};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;
use volfitter_core::types::{MarketQuote, OptionKind, Pricing};

/// Whether `candidate` should replace `existing` at the same strike.
///
/// Two-sided beats one-sided, then the narrower market wins. Ties keep the
/// first listed.
fn replaces(existing: &MarketQuote, candidate: &MarketQuote) -> bool {
    match (existing.width(), candidate.width()) {
        (None, Some(_)) => true,
        (Some(current), Some(new)) => new < current,
        _ => false,
    }
}

/// Raw markets from OptionMetrics option rows.
#[derive(Debug, Clone)]
pub struct OptionMetricsRawIvSupplier {
    source: Arc<SampleCsvSource<OptionRow>>,
}

impl OptionMetricsRawIvSupplier {
    /// Create a supplier over `source`.
    pub fn new(source: Arc<SampleCsvSource<OptionRow>>) -> Self {
        Self { source }
    }
}

impl RawIvSupplier for OptionMetricsRawIvSupplier {
    fn raw_markets(&self, as_of: NaiveDateTime) -> Result<RawMarkets, ServiceError> {
        let mut by_strike: BTreeMap<(NaiveDateTime, i64), MarketQuote> = BTreeMap::new();
        let mut rows = 0usize;

        for row in self.source.rows_on(as_of.date())? {
            rows += 1;
            let (bid_vol, ask_vol) = row.vol_market();
            let quote = MarketQuote {
                strike: row.strike(),
                kind: row.kind()?,
                bid_vol,
                ask_vol,
                last_trade_date: row.last_trade_date()?,
            };

            match by_strike.entry((row.expiry()?, row.strike_key())) {
                std::collections::btree_map::Entry::Vacant(slot) => {
                    slot.insert(quote);
                }
                std::collections::btree_map::Entry::Occupied(mut slot) => {
                    if replaces(slot.get(), &quote) {
                        slot.insert(quote);
                    }
                }
            }
        }

        let mut markets = RawMarkets::new();
        for ((expiry, _), quote) in by_strike {
            markets.entry(expiry).or_default().push(quote);
        }

        debug!(%as_of, rows, expiries = markets.len(), "Raw markets assembled");
        Ok(markets)
    }
}

/// Forward prices from forward rows.
#[derive(Debug, Clone)]
pub struct OptionMetricsForwardCurveSupplier {
    source: Arc<SampleCsvSource<ForwardRow>>,
}

impl OptionMetricsForwardCurveSupplier {
    /// Create a supplier over `source`.
    pub fn new(source: Arc<SampleCsvSource<ForwardRow>>) -> Self {
        Self { source }
    }
}

impl ForwardCurveSupplier for OptionMetricsForwardCurveSupplier {
    fn forwards(
        &self,
        as_of: NaiveDateTime,
        expiries: &[NaiveDateTime],
    ) -> Result<BTreeMap<NaiveDateTime, f64>, ServiceError> {
        let mut available = HashMap::new();
        for row in self.source.rows_on(as_of.date())? {
            available.insert(row.expiry()?, row.forward_price);
        }

        expiries
            .iter()
            .map(|&expiry| {
                available
                    .get(&expiry)
                    .map(|&forward| (expiry, forward))
                    .ok_or(ServiceError::MissingForward { expiry })
            })
            .collect()
    }
}

/// Vega and moneyness from option rows.
#[derive(Debug, Clone)]
pub struct OptionMetricsPricingSupplier {
    source: Arc<SampleCsvSource<OptionRow>>,
}

impl OptionMetricsPricingSupplier {
    /// Create a supplier over `source`.
    pub fn new(source: Arc<SampleCsvSource<OptionRow>>) -> Self {
        Self { source }
    }
}

impl PricingSupplier for OptionMetricsPricingSupplier {
    fn pricing(
        &self,
        as_of: NaiveDateTime,
        expiry: NaiveDateTime,
        forward: f64,
        quotes: &[MarketQuote],
    ) -> Result<Vec<Pricing>, ServiceError> {
        let mut vegas: HashMap<(i64, OptionKind), f64> = HashMap::new();
        for row in self.source.rows_on(as_of.date())? {
            if row.expiry()? == expiry {
                vegas.insert((row.strike_key(), row.kind()?), row.vega.unwrap_or(f64::NAN));
            }
        }

        quotes
            .iter()
            .map(|q| {
                let key = ((q.strike * 1000.0).round() as i64, q.kind);
                let vega = vegas.get(&key).copied().ok_or(ServiceError::MissingPricing {
                    expiry,
                    strike: q.strike,
                    kind: q.kind,
                })?;
                Ok(Pricing {
                    moneyness: q.kind.moneyness((q.strike / forward).ln()),
                    vega,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::fs;
    use volfitter_core::types::Moneyness;

    const OPTION_HEADER: &str =
        "symbol,date,exdate,am_settlement,strike_price,cp_flag,best_bid,best_offer,impl_volatility,vega,last_date\n";

    fn as_of() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn expiry() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 17)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn option_source(dir: &tempfile::TempDir, body: &str) -> Arc<SampleCsvSource<OptionRow>> {
        fs::write(
            dir.path().join("option_data.csv"),
            format!("{}{}", OPTION_HEADER, body),
        )
        .unwrap();
        Arc::new(SampleCsvSource::new(dir.path(), "option_data"))
    }

    #[test]
    fn test_raw_markets_group_by_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let source = option_source(
            &dir,
            "AMZN 1,20200102,20200117,0,90000,P,1.0,1.1,0.30,10.0,20200102\n\
             AMZN 2,20200102,20200117,0,110000,C,1.0,1.1,0.28,10.0,20200102\n\
             AMZN 3,20200102,20200124,1,100000,C,2.0,2.2,0.29,20.0,\n\
             AMZN 4,20200103,20200117,0,100000,C,2.0,2.2,0.29,20.0,20200103\n",
        );

        let markets = OptionMetricsRawIvSupplier::new(source).raw_markets(as_of()).unwrap();

        assert_eq!(markets.len(), 2);
        let near = &markets[&expiry()];
        assert_eq!(near.len(), 2);
        assert_relative_eq!(near[0].strike, 90.0);
        assert_relative_eq!(near[0].bid_vol.unwrap(), 0.295, epsilon = 1e-12);
        assert_relative_eq!(near[0].ask_vol.unwrap(), 0.305, epsilon = 1e-12);

        let far_expiry = NaiveDate::from_ymd_opt(2020, 1, 24)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(markets[&far_expiry][0].last_trade_date, None);
    }

    #[test]
    fn test_raw_markets_keep_two_sided_then_narrower() {
        let dir = tempfile::tempdir().unwrap();
        let source = option_source(
            &dir,
            "A,20200102,20200117,0,100000,C,,1.1,0.30,10.0,20200102\n\
             A,20200102,20200117,0,100000,P,1.0,1.2,0.30,10.0,20200102\n\
             A,20200102,20200117,0,105000,P,1.0,1.1,0.30,10.0,20200102\n\
             A,20200102,20200117,0,105000,C,1.0,1.2,0.30,10.0,20200102\n",
        );

        let markets = OptionMetricsRawIvSupplier::new(source).raw_markets(as_of()).unwrap();
        let quotes = &markets[&expiry()];

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].kind, OptionKind::Put);
        assert!(quotes[0].is_two_sided());
        assert_eq!(quotes[1].kind, OptionKind::Put);
    }

    #[test]
    fn test_raw_markets_reject_bad_flag() {
        let dir = tempfile::tempdir().unwrap();
        let source = option_source(&dir, "A,20200102,20200117,0,100000,X,1.0,1.1,0.3,10.0,\n");
        let result = OptionMetricsRawIvSupplier::new(source).raw_markets(as_of());
        assert!(matches!(result, Err(ServiceError::Data(_))));
    }

    #[test]
    fn test_forwards_for_requested_expiries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("forward_prices.csv"),
            "date,expiration,AMSettlement,ForwardPrice\n\
             20200102,20200117,0,1900.5\n\
             20200102,20200124,0,1901.0\n",
        )
        .unwrap();
        let supplier =
            OptionMetricsForwardCurveSupplier::new(Arc::new(SampleCsvSource::new(dir.path(), "forward_prices")));

        let forwards = supplier.forwards(as_of(), &[expiry()]).unwrap();
        assert_eq!(forwards.len(), 1);
        assert_relative_eq!(forwards[&expiry()], 1900.5);

        let missing = NaiveDate::from_ymd_opt(2020, 2, 21)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        assert!(matches!(
            supplier.forwards(as_of(), &[expiry(), missing]),
            Err(ServiceError::MissingForward { expiry }) if expiry == missing
        ));
    }

    #[test]
    fn test_pricing_moneyness_and_vega() {
        let dir = tempfile::tempdir().unwrap();
        let source = option_source(
            &dir,
            "A,20200102,20200117,0,90000,P,1.0,1.1,0.30,12.5,20200102\n\
             A,20200102,20200117,0,90000,C,1.0,1.1,0.30,12.5,20200102\n\
             A,20200102,20200117,0,110000,P,1.0,1.1,0.30,9.0,20200102\n",
        );
        let quote = |strike: f64, kind| MarketQuote {
            strike,
            kind,
            bid_vol: Some(0.2),
            ask_vol: Some(0.3),
            last_trade_date: None,
        };

        let pricing = OptionMetricsPricingSupplier::new(source)
            .pricing(
                as_of(),
                expiry(),
                100.0,
                &[quote(90.0, OptionKind::Call), quote(110.0, OptionKind::Put)],
            )
            .unwrap();

        assert_eq!(pricing[0].moneyness, Moneyness::Itm);
        assert_relative_eq!(pricing[0].vega, 12.5);
        assert_eq!(pricing[1].moneyness, Moneyness::Itm);
        assert_relative_eq!(pricing[1].vega, 9.0);
    }

    #[test]
    fn test_pricing_missing_row() {
        let dir = tempfile::tempdir().unwrap();
        let source = option_source(&dir, "A,20200102,20200117,0,90000,P,1.0,1.1,0.30,12.5,\n");
        let quote = MarketQuote {
            strike: 95.0,
            kind: OptionKind::Put,
            bid_vol: None,
            ask_vol: None,
            last_trade_date: None,
        };

        let result = OptionMetricsPricingSupplier::new(source).pricing(as_of(), expiry(), 100.0, &[quote]);
        assert!(matches!(result, Err(ServiceError::MissingPricing { .. })));
    }
}
