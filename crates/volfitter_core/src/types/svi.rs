//! SVI total-variance parameterisation.
//!
//! ```text
//! w(k) = level + angle * (tilt * (k - center) + sqrt((k - center)^2 + smoothness^2))
//! ```
//!
//! with `k = ln(K / F)` and `w` the total implied variance `sigma^2 * t`.

use serde::{Deserialize, Serialize};

/// The five raw SVI parameters.
///
/// The natural domain is `smoothness > 0`, `angle >= 0` and `|tilt| <= 1`,
/// but nothing here enforces it: an unconstrained calibration may land
/// outside and the parameters are reported as found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SviParameters {
    /// Overall variance level (`a`).
    pub level: f64,
    /// Slope of the wings (`b`).
    pub angle: f64,
    /// ATM curvature (`sigma`).
    pub smoothness: f64,
    /// Skew between the wings (`rho`).
    pub tilt: f64,
    /// Horizontal translation (`m`).
    pub center: f64,
}

impl SviParameters {
    /// Create a parameter set in `(level, angle, smoothness, tilt, center)` order.
    pub fn new(level: f64, angle: f64, smoothness: f64, tilt: f64, center: f64) -> Self {
        Self {
            level,
            angle,
            smoothness,
            tilt,
            center,
        }
    }

    /// Total implied variance at log-moneyness `k`.
    #[inline]
    pub fn total_variance(&self, k: f64) -> f64 {
        let x = k - self.center;
        self.level
            + self.angle * (self.tilt * x + (x * x + self.smoothness * self.smoothness).sqrt())
    }

    /// Implied volatility at `k` for time to expiry `t`.
    ///
    /// Returns NaN when the total variance is negative or `t` is not positive.
    pub fn implied_vol(&self, k: f64, t: f64) -> f64 {
        let w = self.total_variance(k);
        if w < 0.0 || t <= 0.0 {
            return f64::NAN;
        }
        (w / t).sqrt()
    }

    /// Returns `true` if the parameters satisfy the natural SVI domain.
    pub fn is_in_natural_domain(&self) -> bool {
        self.smoothness > 0.0 && self.angle >= 0.0 && self.tilt.abs() <= 1.0
    }

    /// Returns `true` if every parameter is finite.
    pub fn is_finite(&self) -> bool {
        [self.level, self.angle, self.smoothness, self.tilt, self.center]
            .iter()
            .all(|p| p.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_total_variance_at_center() {
        // w(m) = a + b * sigma
        let p = SviParameters::new(0.04, 0.1, 0.2, -0.5, 0.05);
        assert_relative_eq!(p.total_variance(0.05), 0.06, epsilon = 1e-14);
    }

    #[test]
    fn test_wings_are_asymptotically_linear() {
        let p = SviParameters::new(0.04, 0.1, 0.1, -0.5, 0.0);
        let slope_right = p.total_variance(101.0) - p.total_variance(100.0);
        let slope_left = p.total_variance(-101.0) - p.total_variance(-100.0);
        assert_relative_eq!(slope_right, 0.1 * (1.0 - 0.5), epsilon = 1e-6);
        assert_relative_eq!(slope_left, 0.1 * (1.0 + 0.5), epsilon = 1e-6);
    }

    #[test]
    fn test_implied_vol_negative_variance_is_nan() {
        let p = SviParameters::new(-1.0, 0.1, 0.1, 0.0, 0.0);
        assert!(p.implied_vol(0.0, 1.0).is_nan());
    }

    #[test]
    fn test_natural_domain() {
        assert!(SviParameters::new(0.04, 0.1, 0.1, -0.5, 0.0).is_in_natural_domain());
        assert!(!SviParameters::new(0.04, 0.1, 0.1, -1.5, 0.0).is_in_natural_domain());
        assert!(!SviParameters::new(0.04, -0.1, 0.1, 0.5, 0.0).is_in_natural_domain());
    }
}
