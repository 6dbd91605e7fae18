//! Nelder–Mead downhill simplex minimiser.
//!
//! Derivative-free and unconstrained: the search is free to leave any
//! "natural" domain of the parameters it optimises.
//!
//! # Algorithm
//!
//! Each iteration sorts the `n + 1` vertices by objective value and replaces
//! the worst one by reflecting it through the centroid of the others,
//! expanding or contracting that step as the objective allows. If no
//! candidate improves on the worst vertex, the simplex shrinks towards the
//! best vertex.
//!
//! # Example
//!
//! ```
//! use volfitter_core::math::solvers::{NelderMeadConfig, NelderMeadSolver};
//!
//! // Rosenbrock-like bowl with minimum at (1, 2)
//! let objective = |p: &[f64]| (p[0] - 1.0).powi(2) + 10.0 * (p[1] - 2.0).powi(2);
//!
//! let solver = NelderMeadSolver::new(NelderMeadConfig::default());
//! let result = solver.minimize(objective, &[0.0, 0.0]).unwrap();
//!
//! assert!(result.converged);
//! assert!((result.params[0] - 1.0).abs() < 1e-6);
//! assert!((result.params[1] - 2.0).abs() < 1e-6);
//! ```

use crate::types::SolverError;

/// Configuration for the Nelder–Mead solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex iterations.
    pub max_iterations: usize,
    /// Offset added to each coordinate of the start point to build the
    /// initial simplex.
    pub initial_step: f64,
    /// Convergence threshold on the largest vertex distance from the centroid.
    pub x_tolerance: f64,
    /// Convergence threshold on the spread of objective values.
    pub f_tolerance: f64,
    /// Reflection coefficient.
    pub reflection: f64,
    /// Expansion coefficient.
    pub expansion: f64,
    /// Contraction coefficient.
    pub contraction: f64,
    /// Shrink coefficient.
    pub shrink: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            initial_step: 0.05,
            x_tolerance: 1e-10,
            f_tolerance: 1e-14,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

impl NelderMeadConfig {
    /// Create a configuration with the given iteration cap and tolerances.
    pub fn new(max_iterations: usize, x_tolerance: f64, f_tolerance: f64) -> Self {
        Self {
            max_iterations,
            x_tolerance,
            f_tolerance,
            ..Default::default()
        }
    }

    /// Create a fast configuration with relaxed tolerances.
    pub fn fast() -> Self {
        Self {
            max_iterations: 300,
            x_tolerance: 1e-6,
            f_tolerance: 1e-10,
            ..Default::default()
        }
    }

    /// Replace the initial simplex step.
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }
}

/// Result of a Nelder–Mead minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct NelderMeadResult {
    /// Best vertex found.
    pub params: Vec<f64>,
    /// Objective value at `params`.
    pub value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of objective evaluations.
    pub evaluations: usize,
    /// Whether both tolerances were met before the iteration cap.
    pub converged: bool,
}

/// Nelder–Mead simplex minimiser.
///
/// Running out of iterations is not an error: the best vertex is returned
/// with `converged == false` and the caller decides what that means.
#[derive(Debug, Clone)]
pub struct NelderMeadSolver {
    config: NelderMeadConfig,
}

impl NelderMeadSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: NelderMeadConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(NelderMeadConfig::default())
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &NelderMeadConfig {
        &self.config
    }

    /// Minimise `objective` starting from `initial`.
    ///
    /// NaN objective values sort above every finite value, so a vertex that
    /// evaluates to NaN is always the first to be replaced.
    ///
    /// # Errors
    ///
    /// - `SolverError::DimensionMismatch` if `initial` is empty
    /// - `SolverError::NumericalInstability` if `initial` contains a
    ///   non-finite value or the initial step is zero or non-finite
    pub fn minimize<F>(&self, mut objective: F, initial: &[f64]) -> Result<NelderMeadResult, SolverError>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let dim = initial.len();
        if dim == 0 {
            return Err(SolverError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        if initial.iter().any(|x| !x.is_finite()) {
            return Err(SolverError::NumericalInstability(
                "non-finite initial point".to_string(),
            ));
        }
        let step = self.config.initial_step;
        if !(step.is_finite() && step != 0.0) {
            return Err(SolverError::NumericalInstability(format!(
                "invalid initial step {}",
                step
            )));
        }

        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
        simplex.push(initial.to_vec());
        for d in 0..dim {
            let mut vertex = initial.to_vec();
            vertex[d] += step;
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|x| objective(x)).collect();
        let mut evaluations = dim + 1;

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            sort_simplex(&mut simplex, &mut values);

            let centroid = centroid(&simplex[..dim]);
            let spread = (values[dim] - values[0]).abs();
            let size = simplex
                .iter()
                .map(|x| distance(x, &centroid))
                .fold(0.0_f64, f64::max);

            if spread <= self.config.f_tolerance && size <= self.config.x_tolerance {
                converged = true;
                break;
            }
            iterations += 1;

            let reflected = affine(&centroid, &simplex[dim], -self.config.reflection);
            let f_reflected = objective(&reflected);
            evaluations += 1;

            if f_reflected < values[0] {
                let expanded = affine(&centroid, &reflected, self.config.expansion);
                let f_expanded = objective(&expanded);
                evaluations += 1;

                if f_expanded < f_reflected {
                    simplex[dim] = expanded;
                    values[dim] = f_expanded;
                } else {
                    simplex[dim] = reflected;
                    values[dim] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[dim - 1] {
                simplex[dim] = reflected;
                values[dim] = f_reflected;
                continue;
            }

            let contracted = affine(&centroid, &simplex[dim], self.config.contraction);
            let f_contracted = objective(&contracted);
            evaluations += 1;

            if f_contracted < values[dim] {
                simplex[dim] = contracted;
                values[dim] = f_contracted;
                continue;
            }

            // Shrink every vertex towards the best one.
            let best = simplex[0].clone();
            for i in 1..=dim {
                simplex[i] = affine(&best, &simplex[i], self.config.shrink);
                values[i] = objective(&simplex[i]);
                evaluations += 1;
            }
        }

        sort_simplex(&mut simplex, &mut values);
        Ok(NelderMeadResult {
            params: simplex.swap_remove(0),
            value: values[0],
            iterations,
            evaluations,
            converged,
        })
    }
}

/// Sort vertices by ascending objective value (NaN last).
fn sort_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
    *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let dim = vertices[0].len();
    (0..dim)
        .map(|d| vertices.iter().map(|x| x[d]).sum::<f64>() / n)
        .collect()
}

/// `origin + coeff * (target - origin)`
fn affine(origin: &[f64], target: &[f64], coeff: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, t)| o + coeff * (t - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
