//! Fixed-step integrators for `θ̇ = f(θ)`.

use serde::{Deserialize, Serialize};

use crate::error::EvolveResult;

/// Explicit one-step method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OdeSolver {
    /// Forward Euler, one derivative evaluation per step.
    Euler,
    /// Classic fourth-order Runge–Kutta, four evaluations per step.
    #[default]
    Rk4,
}

fn axpy(theta: &[f64], h: f64, k: &[f64]) -> Vec<f64> {
    theta.iter().zip(k).map(|(t, d)| t + h * d).collect()
}

impl OdeSolver {
    /// Derivative evaluations per step.
    pub fn stages(self) -> usize {
        match self {
            OdeSolver::Euler => 1,
            OdeSolver::Rk4 => 4,
        }
    }

    /// Advance `theta` by `dt`.
    pub fn step<F>(self, theta: &[f64], dt: f64, mut f: F) -> EvolveResult<Vec<f64>>
    where
        F: FnMut(&[f64]) -> EvolveResult<Vec<f64>>,
    {
        match self {
            OdeSolver::Euler => Ok(axpy(theta, dt, &f(theta)?)),
            OdeSolver::Rk4 => {
                let k1 = f(theta)?;
                let k2 = f(&axpy(theta, dt / 2.0, &k1))?;
                let k3 = f(&axpy(theta, dt / 2.0, &k2))?;
                let k4 = f(&axpy(theta, dt, &k3))?;
                Ok(theta
                    .iter()
                    .enumerate()
                    .map(|(i, t)| t + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
                    .collect())
            }
        }
    }
}
