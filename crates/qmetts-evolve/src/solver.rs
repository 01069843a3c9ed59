//! Regularised least-squares solve of `A θ̇ = C`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{EvolveError, EvolveResult};

/// Default Tikhonov shift added to the metric diagonal.
pub const DEFAULT_REGULARIZATION: f64 = 1e-8;

/// Default relative cutoff for discarding small singular values.
pub const DEFAULT_RCOND: f64 = 1e-2;

/// Solves the McLachlan system through a truncated SVD of `A + λI`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSolver {
    /// Tikhonov shift λ.
    pub regularization: f64,
    /// Singular values below `rcond · σ_max` are treated as zero.
    pub rcond: f64,
}

impl Default for LinearSolver {
    fn default() -> Self {
        Self {
            regularization: DEFAULT_REGULARIZATION,
            rcond: DEFAULT_RCOND,
        }
    }
}

/// Parameter derivative and the conditioning of the system it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// `θ̇`.
    pub derivative: Vec<f64>,
    /// `σ_max / σ_min` of the unregularised `A`; infinite when singular.
    pub condition_number: f64,
}

impl LinearSolver {
    /// Create a solver.
    pub fn new(regularization: f64, rcond: f64) -> Self {
        Self {
            regularization,
            rcond,
        }
    }

    /// Solve `(A + λI) x = C` in the pseudo-inverse sense.
    pub fn solve(&self, metric: &DMatrix<f64>, rhs: &DVector<f64>) -> EvolveResult<Solution> {
        let p = metric.nrows();
        if metric.ncols() != p || rhs.len() != p {
            return Err(EvolveError::Solver(format!(
                "metric is {}x{} but right-hand side has {} entries",
                p,
                metric.ncols(),
                rhs.len()
            )));
        }
        if p == 0 {
            return Ok(Solution {
                derivative: Vec::new(),
                condition_number: 1.0,
            });
        }

        let condition_number = condition_number(metric);

        let regularized = metric + DMatrix::identity(p, p) * self.regularization;
        let svd = regularized.svd(true, true);
        let sigma_max = svd.singular_values.max();

        let x = svd
            .solve(rhs, self.rcond * sigma_max)
            .map_err(|e| EvolveError::Solver(e.to_string()))?;

        Ok(Solution {
            derivative: x.iter().copied().collect(),
            condition_number,
        })
    }
}

/// `σ_max / σ_min` of a square matrix. Singular matrices give infinity.
pub fn condition_number(matrix: &DMatrix<f64>) -> f64 {
    if matrix.is_empty() {
        return 1.0;
    }
    let singular_values = matrix.singular_values();
    let sigma_max = singular_values.max();
    let sigma_min = singular_values.min();
    if sigma_min > 0.0 {
        sigma_max / sigma_min
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_conditioned_solve() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 0.5]);
        let c = DVector::from_vec(vec![1.0, 1.0]);
        let solution = LinearSolver::new(0.0, 1e-12).solve(&a, &c).unwrap();
        assert!((solution.derivative[0] - 0.5).abs() < 1e-12);
        assert!((solution.derivative[1] - 2.0).abs() < 1e-12);
        assert!((solution.condition_number - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_singular_direction_is_dropped() {
        // The second direction is redundant; the pseudo-inverse ignores it.
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        let c = DVector::from_vec(vec![3.0, 0.0]);
        let solution = LinearSolver::default().solve(&a, &c).unwrap();
        assert!((solution.derivative[0] - 3.0).abs() < 1e-6);
        assert!(solution.derivative[1].abs() < 1e-12);
        assert_eq!(solution.condition_number, f64::INFINITY);
    }

    #[test]
    fn test_regularization_does_not_hide_singularity() {
        let a = DMatrix::from_row_slice(2, 2, &[0.25, 0.0, 0.0, 0.0]);
        let c = DVector::from_vec(vec![1.0, 0.0]);
        let solution = LinearSolver::new(1e-2, DEFAULT_RCOND).solve(&a, &c).unwrap();
        assert!(solution.condition_number > 1e10);
        assert!((condition_number(&DMatrix::identity(3, 3)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = DMatrix::<f64>::identity(2, 2);
        let c = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            LinearSolver::default().solve(&a, &c),
            Err(EvolveError::Solver(_))
        ));
    }
}
