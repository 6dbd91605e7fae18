//! Surface fitter variants.
//!
//! Both variants share one contract: a curve whose status is not `Ok` comes
//! back with no points, no parameters and its status untouched.

use super::svi::{QuasiExplicitSviCalibrator, SviCalibrationData, SviCalibrator, MIN_CALIBRATION_POINTS};
use super::CalibrationError;
use crate::config::{FitterConfig, FitterKind, SviCalibratorKind};
use tracing::{debug, warn};
use volfitter_core::types::{FilteredCurve, FittedCurve, FittedPoint, Status};

/// Status message when too few included two-sided quotes remain for SVI.
pub const INSUFFICIENT_SVI_POINTS_MESSAGE: &str = "Insufficient points for SVI calibration";

/// The fitter applied to each filtered curve.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceFitter {
    /// Fitted vol equals the market mid wherever both sides are quoted.
    MidMarket,
    /// Per-expiry SVI calibration.
    Svi(QuasiExplicitSviCalibrator),
}

impl SurfaceFitter {
    /// Build the configured fitter.
    ///
    /// # Errors
    ///
    /// `CalibrationError::NotImplemented` for the constrained SVI calibrator.
    pub fn from_config(config: &FitterConfig) -> Result<Self, CalibrationError> {
        match (config.kind, config.calibrator) {
            (FitterKind::MidMarket, _) => Ok(SurfaceFitter::MidMarket),
            (FitterKind::Svi, SviCalibratorKind::UnconstrainedQuasiExplicit) => Ok(
                SurfaceFitter::Svi(QuasiExplicitSviCalibrator::from_config(config)),
            ),
            (FitterKind::Svi, SviCalibratorKind::Constrained) => {
                Err(CalibrationError::NotImplemented {
                    name: "constrained".to_string(),
                })
            }
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceFitter::MidMarket => "mid_market",
            SurfaceFitter::Svi(calibrator) => calibrator.name(),
        }
    }

    /// Fit one filtered curve.
    pub fn fit(&self, curve: &FilteredCurve) -> FittedCurve {
        let expiry = curve.raw().expiry();
        if !curve.status().is_ok() {
            debug!(%expiry, status = %curve.status(), "Skipping fit");
            return FittedCurve::unfitted(expiry, curve.status().clone());
        }

        match self {
            SurfaceFitter::MidMarket => fit_mid_market(curve),
            SurfaceFitter::Svi(calibrator) => fit_svi(calibrator, curve),
        }
    }
}

impl Default for SurfaceFitter {
    fn default() -> Self {
        SurfaceFitter::Svi(QuasiExplicitSviCalibrator::default())
    }
}

fn fit_mid_market(curve: &FilteredCurve) -> FittedCurve {
    let raw = curve.raw();
    let t = raw.time_to_expiry();
    let points = raw
        .quotes()
        .iter()
        .filter_map(|q| {
            let mid = q.market.mid_vol()?;
            Some(FittedPoint {
                strike: q.strike(),
                log_moneyness: raw.log_moneyness(q.strike()),
                total_variance: mid * mid * t,
                vol: mid,
            })
        })
        .collect();

    FittedCurve {
        expiry: raw.expiry(),
        status: curve.status().clone(),
        points,
        parameters: None,
        diagnostics: None,
    }
}

fn fit_svi<C: SviCalibrator>(calibrator: &C, curve: &FilteredCurve) -> FittedCurve {
    let raw = curve.raw();
    let expiry = raw.expiry();
    let t = raw.time_to_expiry();

    let mut data = SviCalibrationData::new();
    for q in curve.included_quotes() {
        if let Some(mid) = q.market.mid_vol() {
            data.push(raw.log_moneyness(q.strike()), mid * mid * t);
        }
    }

    let unfitted = |status: Status| {
        warn!(%expiry, message = status.message(), "SVI fit failed");
        FittedCurve::unfitted(expiry, curve.status().clone()).escalated(status)
    };

    if data.len() < MIN_CALIBRATION_POINTS {
        return unfitted(Status::fail(INSUFFICIENT_SVI_POINTS_MESSAGE));
    }

    let result = match calibrator.calibrate(&data) {
        Ok(result) => result,
        Err(e) => return unfitted(Status::fail(format!("SVI calibration failed: {}", e))),
    };
    let params = result.parameters;
    let diagnostics = result.diagnostics;

    if !diagnostics.converged {
        warn!(
            %expiry,
            iterations = diagnostics.iterations,
            rmse = diagnostics.rmse,
            "SVI search hit the iteration cap; using best parameters found"
        );
    }
    if !params.is_in_natural_domain() {
        debug!(%expiry, ?params, "SVI parameters outside the natural domain");
    }

    let points: Vec<FittedPoint> = raw
        .quotes()
        .iter()
        .map(|q| {
            let k = raw.log_moneyness(q.strike());
            FittedPoint {
                strike: q.strike(),
                log_moneyness: k,
                total_variance: params.total_variance(k),
                vol: params.implied_vol(k, t),
            }
        })
        .collect();

    if let Some(bad) = points.iter().find(|p| !p.vol.is_finite()) {
        let message = format!(
            "SVI fit has negative or non-finite variance {:.6e} at strike {}",
            bad.total_variance, bad.strike
        );
        let mut fitted = unfitted(Status::fail(message));
        fitted.parameters = Some(params);
        fitted.diagnostics = Some(diagnostics);
        return fitted;
    }

    debug!(
        %expiry,
        calibrator = calibrator.name(),
        iterations = diagnostics.iterations,
        rmse = diagnostics.rmse,
        "SVI fit complete"
    );

    FittedCurve {
        expiry,
        status: curve.status().clone(),
        points,
        parameters: Some(params),
        diagnostics: Some(diagnostics),
    }
}
