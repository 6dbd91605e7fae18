//! Filter → fit → validate, per expiry.

use crate::calibration::{CalibrationError, SurfaceFitter};
use crate::config::{FinalIvValidationConfig, FitterConfig, RawIvFilteringConfig};
use crate::filtering::FilterEngine;
use crate::validation::ValidationEngine;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::info_span;
use volfitter_core::types::{FittedCurve, RawCurve};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The three stages applied to every expiry of a surface.
///
/// # Example
///
/// ```
/// use volfitter_models::pipeline::CurvePipeline;
///
/// let pipeline = CurvePipeline::default();
/// assert_eq!(pipeline.fitter().name(), "unconstrained_quasi_explicit");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CurvePipeline {
    filter: FilterEngine,
    fitter: SurfaceFitter,
    validator: ValidationEngine,
}

impl CurvePipeline {
    /// Assemble a pipeline from its stages.
    pub fn new(filter: FilterEngine, fitter: SurfaceFitter, validator: ValidationEngine) -> Self {
        Self {
            filter,
            fitter,
            validator,
        }
    }

    /// Build every stage from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured calibrator is not implemented.
    pub fn from_config(
        filtering: &RawIvFilteringConfig,
        fitter: &FitterConfig,
        validation: &FinalIvValidationConfig,
    ) -> Result<Self, CalibrationError> {
        Ok(Self::new(
            FilterEngine::from_config(filtering),
            SurfaceFitter::from_config(fitter)?,
            ValidationEngine::from_config(validation),
        ))
    }

    /// Filtering stage.
    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    /// Fitting stage.
    pub fn fitter(&self) -> &SurfaceFitter {
        &self.fitter
    }

    /// Validation stage.
    pub fn validator(&self) -> &ValidationEngine {
        &self.validator
    }

    /// Run all three stages on one expiry.
    pub fn run(&self, raw: RawCurve, as_of: NaiveDate) -> FittedCurve {
        let span = info_span!("expiry", expiry = %raw.expiry());
        let _guard = span.enter();

        let filtered = self.filter.filter(raw, as_of);
        let fitted = self.fitter.fit(&filtered);
        self.validator.validate(fitted, filtered.raw())
    }

    /// Run every expiry independently, keyed by expiry.
    ///
    /// With the `parallel` feature the expiries run on the rayon pool;
    /// the result is identical either way.
    pub fn run_all(&self, curves: Vec<RawCurve>, as_of: NaiveDate) -> BTreeMap<NaiveDateTime, FittedCurve> {
        #[cfg(feature = "parallel")]
        let iter = curves.into_par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = curves.into_iter();

        iter.map(|raw| {
            let fitted = self.run(raw, as_of);
            (fitted.expiry, fitted)
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FitterKind;
    use volfitter_core::types::{MarketQuote, Moneyness, OptionKind, Pricing, Quote, Tag};

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn expiry(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn curve(day: u32, t: f64) -> RawCurve {
        let quotes = (0..6)
            .map(|i| {
                Quote::new(
                    MarketQuote {
                        strike: 80.0 + 8.0 * i as f64,
                        kind: OptionKind::Put,
                        bid_vol: Some(0.2),
                        ask_vol: Some(0.22),
                        last_trade_date: Some(as_of()),
                    },
                    Pricing {
                        moneyness: Moneyness::Otm,
                        vega: 10.0,
                    },
                )
            })
            .collect();
        RawCurve::new(expiry(day), 100.0, t, quotes).unwrap()
    }

    #[test]
    fn test_from_config_defaults() {
        let pipeline = CurvePipeline::from_config(
            &RawIvFilteringConfig::default(),
            &FitterConfig::default(),
            &FinalIvValidationConfig::default(),
        )
        .unwrap();
        assert_eq!(pipeline.filter().checks().len(), 6);
        assert_eq!(pipeline.validator().checks().len(), 1);
    }

    #[test]
    fn test_expiries_are_independent() {
        let fitter = FitterConfig {
            kind: FitterKind::MidMarket,
            ..Default::default()
        };
        let pipeline = CurvePipeline::from_config(
            &RawIvFilteringConfig::default(),
            &fitter,
            &FinalIvValidationConfig::default(),
        )
        .unwrap();

        let surface = pipeline.run_all(vec![curve(21, 0.5), curve(14, -0.01)], as_of());
        assert_eq!(surface.len(), 2);
        assert_eq!(surface[&expiry(21)].status.tag(), Tag::Ok);
        assert_eq!(surface[&expiry(21)].points.len(), 6);
        assert_eq!(surface[&expiry(14)].status.tag(), Tag::Fail);
        assert!(surface[&expiry(14)].points.is_empty());
    }
}
