//! Ordinary linear least squares via the normal equations.
//!
//! Solves `min_x ||A x - y||^2` by forming `A^T A x = A^T y` and factorising
//! with Cholesky. Intended for small, well-scaled designs (a handful of
//! regressors); ill-conditioned designs are reported as singular rather than
//! returning amplified noise.

use crate::types::SolverError;

/// Relative pivot threshold below which the normal matrix is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-13;

/// Least-squares coefficients and fit quality.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresResult {
    /// Fitted coefficients, one per regressor.
    pub coefficients: Vec<f64>,
    /// Sum of squared residuals `||A x - y||^2`.
    pub residual_ss: f64,
}

/// Fit `targets ≈ design * coefficients` with `N` regressors per row.
///
/// # Errors
///
/// - `SolverError::DimensionMismatch` if `design` and `targets` differ in length
///   or there are fewer rows than regressors
/// - `SolverError::SingularSystem` if the regressors are (numerically) collinear
///
/// # Examples
/// ```
/// use volfitter_core::math::solvers::linear_least_squares;
///
/// // y = 1 + 2x
/// let design = [[1.0, 0.0], [1.0, 1.0], [1.0, 2.0]];
/// let targets = [1.0, 3.0, 5.0];
/// let fit = linear_least_squares(&design, &targets).unwrap();
///
/// assert!((fit.coefficients[0] - 1.0).abs() < 1e-12);
/// assert!((fit.coefficients[1] - 2.0).abs() < 1e-12);
/// ```
pub fn linear_least_squares<const N: usize>(
    design: &[[f64; N]],
    targets: &[f64],
) -> Result<LeastSquaresResult, SolverError> {
    if design.len() != targets.len() {
        return Err(SolverError::DimensionMismatch {
            expected: design.len(),
            actual: targets.len(),
        });
    }
    if design.len() < N {
        return Err(SolverError::DimensionMismatch {
            expected: N,
            actual: design.len(),
        });
    }

    let mut normal = vec![vec![0.0; N]; N];
    let mut rhs = vec![0.0; N];
    for (row, &y) in design.iter().zip(targets) {
        for i in 0..N {
            rhs[i] += row[i] * y;
            for j in 0..=i {
                normal[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..N {
        for j in 0..i {
            normal[j][i] = normal[i][j];
        }
    }

    let coefficients = solve_cholesky(&normal, &rhs).ok_or_else(|| {
        SolverError::SingularSystem("normal equations are not positive definite".to_string())
    })?;

    let residual_ss = design
        .iter()
        .zip(targets)
        .map(|(row, &y)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(a, c)| a * c).sum();
            (fitted - y) * (fitted - y)
        })
        .sum();

    Ok(LeastSquaresResult {
        coefficients,
        residual_ss,
    })
}

/// Solve `A x = b` for symmetric positive definite `A`.
fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L L^T
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum.is_nan() || sum <= PIVOT_TOLERANCE * a[i][i].abs() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // L^T x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}
