//! Robust location and dispersion statistics.

/// Median of `values`, or `None` if empty or any value is NaN.
///
/// Even-length inputs return the mean of the two middle values.
///
/// # Examples
/// ```
/// use volfitter_core::math::stats::median;
///
/// assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
/// assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
/// assert_eq!(median(&[]), None);
/// ```
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation `median(|x - median(x)|)`, unscaled.
///
/// # Examples
/// ```
/// use volfitter_core::math::stats::median_absolute_deviation;
///
/// assert_eq!(median_absolute_deviation(&[1.0, 1.0, 1.0, 1.0, 10.0]), Some(0.0));
/// assert_eq!(median_absolute_deviation(&[1.0, 2.0, 4.0]), Some(1.0));
/// ```
pub fn median_absolute_deviation(values: &[f64]) -> Option<f64> {
    median_and_mad(values).map(|(_, mad)| mad)
}

/// `(median, MAD)` of `values`.
pub fn median_and_mad(values: &[f64]) -> Option<(f64, f64)> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    let mad = median(&deviations)?;
    Some((center, mad))
}
