//! The fit cycle.
//!
//! One cycle takes a snapshot of the world through the ports, assembles a
//! [`RawCurve`] per expiry, runs the per-expiry pipeline, and hands the
//! resulting [`FittedSurface`] to the consumer.

use crate::adapters::{
    CyclingClock, JsonFileConsumer, OptionMetricsForwardCurveSupplier, OptionMetricsPricingSupplier,
    OptionMetricsRawIvSupplier, SampleCsvSource,
};
use crate::config::{VolfitterConfig, VolfitterMode};
use crate::error::ServiceError;
use crate::ports::{
    CurrentTimeSupplier, FinalIvConsumer, ForwardCurveSupplier, PricingSupplier, RawIvSupplier,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span};
use volfitter_core::types::{year_fraction_act365, FittedSurface, Quote, RawCurve};
use volfitter_models::CurvePipeline;

/// Outcome of one fit cycle.
#[derive(Debug, Clone, Serialize)]
pub struct FitCycleResult {
    /// Snapshot time the cycle fitted
    pub as_of: NaiveDateTime,
    /// Every expiry with its status
    pub surface: FittedSurface,
    /// Wall time of the cycle
    pub duration_ms: u64,
    /// Non-fatal failures, such as the consumer rejecting the surface
    pub errors: Vec<String>,
}

/// Orchestrates suppliers, the pipeline and the consumer.
pub struct VolfitterService {
    symbol: String,
    clock: Box<dyn CurrentTimeSupplier>,
    raw_iv: Box<dyn RawIvSupplier>,
    forwards: Box<dyn ForwardCurveSupplier>,
    pricing: Box<dyn PricingSupplier>,
    pipeline: CurvePipeline,
    consumer: Box<dyn FinalIvConsumer>,
}

impl std::fmt::Debug for VolfitterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolfitterService")
            .field("symbol", &self.symbol)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl VolfitterService {
    /// Wire a service from explicit collaborators.
    pub fn new(
        symbol: impl Into<String>,
        clock: Box<dyn CurrentTimeSupplier>,
        raw_iv: Box<dyn RawIvSupplier>,
        forwards: Box<dyn ForwardCurveSupplier>,
        pricing: Box<dyn PricingSupplier>,
        pipeline: CurvePipeline,
        consumer: Box<dyn FinalIvConsumer>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            clock,
            raw_iv,
            forwards,
            pricing,
            pipeline,
            consumer,
        }
    }

    /// Wire the service the configuration describes.
    ///
    /// # Errors
    ///
    /// Fails for modes without adapters, for an unimplemented calibrator, or
    /// if the sample option data cannot be read.
    pub fn from_config(config: &VolfitterConfig) -> Result<Self, ServiceError> {
        let pipeline = CurvePipeline::from_config(
            &config.raw_iv_filtering,
            &config.fitter,
            &config.final_iv_validation,
        )?;

        match config.mode {
            VolfitterMode::SampleData => {}
            other => return Err(ServiceError::UnsupportedMode(other)),
        }

        let sample = &config.sample_data;
        let input_dir = sample.input_dir(&config.symbol);
        let options = Arc::new(SampleCsvSource::new(
            &input_dir,
            sample.option_data_file_substring.clone(),
        ));
        let forwards = Arc::new(SampleCsvSource::new(
            &input_dir,
            sample.forward_data_file_substring.clone(),
        ));
        let clock = CyclingClock::from_option_data(&options)?;

        info!(
            symbol = %config.symbol,
            input = %input_dir.display(),
            snapshots = clock.times().len(),
            fitter = pipeline.fitter().name(),
            "Sample data service configured"
        );

        Ok(Self::new(
            config.symbol.clone(),
            Box::new(clock),
            Box::new(OptionMetricsRawIvSupplier::new(Arc::clone(&options))),
            Box::new(OptionMetricsForwardCurveSupplier::new(forwards)),
            Box::new(OptionMetricsPricingSupplier::new(options)),
            pipeline,
            Box::new(JsonFileConsumer::new(sample.output_file(&config.symbol))),
        ))
    }

    /// Underlying symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Run one full fit cycle.
    ///
    /// # Errors
    ///
    /// Supplier failures and curve assembly failures abort the cycle. A
    /// consumer failure does not; it is recorded in the result's `errors`.
    pub fn fit_full_surface(&self) -> Result<FitCycleResult, ServiceError> {
        let started = Instant::now();
        let as_of = self.clock.now();

        let span = info_span!("fit_cycle", symbol = %self.symbol, %as_of);
        let _guard = span.enter();

        let curves = self.assemble_curves(as_of)?;
        let surface = FittedSurface {
            symbol: self.symbol.clone(),
            as_of,
            curves: self.pipeline.run_all(curves, as_of.date()),
        };

        let mut errors = Vec::new();
        if let Err(e) = self.consumer.consume(&surface) {
            error!(error = %e, "Failed to publish fitted surface");
            errors.push(e.to_string());
        }

        let [ok, warn, fail] = surface.tag_counts();
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            expiries = surface.curves.len(),
            ok,
            warn,
            fail,
            duration_ms,
            "Fit cycle complete"
        );

        Ok(FitCycleResult {
            as_of,
            surface,
            duration_ms,
            errors,
        })
    }

    fn assemble_curves(&self, as_of: NaiveDateTime) -> Result<Vec<RawCurve>, ServiceError> {
        let markets = self.raw_iv.raw_markets(as_of)?;
        let expiries: Vec<NaiveDateTime> = markets.keys().copied().collect();
        let forwards = self.forwards.forwards(as_of, &expiries)?;

        markets
            .into_iter()
            .map(|(expiry, quotes)| {
                let forward = forwards
                    .get(&expiry)
                    .copied()
                    .ok_or(ServiceError::MissingForward { expiry })?;

                let pricing = self.pricing.pricing(as_of, expiry, forward, &quotes)?;
                if pricing.len() != quotes.len() {
                    return Err(ServiceError::data(format!(
                        "Pricing supplier returned {} rows for {} quotes at {}",
                        pricing.len(),
                        quotes.len(),
                        expiry
                    )));
                }

                let quotes = quotes.into_iter().zip(pricing).map(|(m, p)| Quote::new(m, p)).collect();
                RawCurve::new(expiry, forward, year_fraction_act365(as_of, expiry), quotes)
                    .map_err(|source| ServiceError::Curve { expiry, source })
            })
            .collect()
    }
}
