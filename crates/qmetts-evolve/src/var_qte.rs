//! Variational time evolution engine shared by VarQITE and VarQRTE.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use qmetts_sim::PauliOperator;

use crate::ansatz::{Ansatz, check_parameter_count};
use crate::error::{EvolveError, EvolveResult};
use crate::gradient::tangent_states;
use crate::ode::OdeSolver;
use crate::principle::{VariationalPrinciple, evolution_gradient, metric_tensor};
use crate::problem::TimeEvolutionProblem;
use crate::result::TimeEvolutionResult;
use crate::solver::{DEFAULT_RCOND, DEFAULT_REGULARIZATION, LinearSolver};

fn default_step_size() -> f64 {
    0.01
}

fn default_regularization() -> f64 {
    DEFAULT_REGULARIZATION
}

fn default_rcond() -> f64 {
    DEFAULT_RCOND
}

fn default_condition_threshold() -> f64 {
    1e10
}

/// Step and solver settings of a variational evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolverConfig {
    /// Fixed number of steps. When unset the count is `round(time / step_size)`.
    #[serde(default)]
    pub num_timesteps: Option<usize>,
    /// Target step length used when `num_timesteps` is unset.
    #[serde(default = "default_step_size")]
    pub step_size: f64,
    /// Integrator.
    #[serde(default)]
    pub ode: OdeSolver,
    /// Tikhonov shift on the metric.
    #[serde(default = "default_regularization")]
    pub regularization: f64,
    /// Relative singular-value cutoff.
    #[serde(default = "default_rcond")]
    pub rcond: f64,
    /// Condition numbers above this are reported.
    #[serde(default = "default_condition_threshold")]
    pub condition_threshold: f64,
    /// Abort instead of warning on an ill-conditioned step.
    #[serde(default)]
    pub fail_on_ill_conditioned: bool,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            num_timesteps: None,
            step_size: default_step_size(),
            ode: OdeSolver::default(),
            regularization: default_regularization(),
            rcond: default_rcond(),
            condition_threshold: default_condition_threshold(),
            fail_on_ill_conditioned: false,
        }
    }
}

impl EvolverConfig {
    /// Fix the number of steps.
    #[must_use]
    pub fn with_num_timesteps(mut self, steps: usize) -> Self {
        self.num_timesteps = Some(steps);
        self
    }

    /// Set the target step length.
    #[must_use]
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Set the integrator.
    #[must_use]
    pub fn with_ode_solver(mut self, ode: OdeSolver) -> Self {
        self.ode = ode;
        self
    }

    /// Set the Tikhonov shift.
    #[must_use]
    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    /// Set the singular-value cutoff.
    #[must_use]
    pub fn with_rcond(mut self, rcond: f64) -> Self {
        self.rcond = rcond;
        self
    }

    /// Set the condition threshold and whether exceeding it is fatal.
    #[must_use]
    pub fn with_condition_threshold(mut self, threshold: f64, fail: bool) -> Self {
        self.condition_threshold = threshold;
        self.fail_on_ill_conditioned = fail;
        self
    }

    /// Number of steps needed to reach `time`.
    pub fn num_steps(&self, time: f64) -> EvolveResult<usize> {
        match self.num_timesteps {
            Some(0) => Err(EvolveError::InvalidSteps(
                "num_timesteps must be at least 1".into(),
            )),
            Some(steps) => Ok(steps),
            None => {
                if !self.step_size.is_finite() || self.step_size <= 0.0 {
                    return Err(EvolveError::InvalidSteps(format!(
                        "step_size must be positive, got {}",
                        self.step_size
                    )));
                }
                Ok(((time / self.step_size).round() as usize).max(1))
            }
        }
    }

    /// Solver built from the regularisation settings.
    pub fn solver(&self) -> LinearSolver {
        LinearSolver::new(self.regularization, self.rcond)
    }
}

/// McLachlan variational time evolution of an ansatz.
///
/// Each step builds `|ψ(θ)⟩` and its tangent vectors exactly, assembles
/// `A θ̇ = C` under the principle `P`, solves it with [`LinearSolver`] and
/// advances θ with the configured [`OdeSolver`].
#[derive(Debug)]
pub struct VarQte<P: VariationalPrinciple> {
    ansatz: Box<dyn Ansatz>,
    principle: P,
    config: EvolverConfig,
}

impl<P: VariationalPrinciple + Default> VarQte<P> {
    /// Evolver with default settings.
    pub fn new(ansatz: Box<dyn Ansatz>) -> Self {
        Self::with_principle(ansatz, P::default())
    }
}

impl<P: VariationalPrinciple> VarQte<P> {
    /// Evolver with an explicit principle.
    pub fn with_principle(ansatz: Box<dyn Ansatz>, principle: P) -> Self {
        Self {
            ansatz,
            principle,
            config: EvolverConfig::default(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_config(mut self, config: EvolverConfig) -> Self {
        self.config = config;
        self
    }

    /// The evolved ansatz.
    pub fn ansatz(&self) -> &dyn Ansatz {
        self.ansatz.as_ref()
    }

    /// The principle.
    pub fn principle(&self) -> &P {
        &self.principle
    }

    /// Current settings.
    pub fn config(&self) -> &EvolverConfig {
        &self.config
    }

    /// `θ̇` at `theta` and the condition number of the system solved.
    pub fn parameter_derivative(
        &self,
        hamiltonian: &PauliOperator,
        theta: &[f64],
    ) -> EvolveResult<(Vec<f64>, f64)> {
        let tangent = tangent_states(self.ansatz.as_ref(), theta)?;
        let metric = metric_tensor(&tangent);
        let (_, rhs) = evolution_gradient(&self.principle, hamiltonian, &tangent)?;
        let solution = self.config.solver().solve(&metric, &rhs)?;
        Ok((solution.derivative, solution.condition_number))
    }

    fn measure(&self, problem: &TimeEvolutionProblem, theta: &[f64]) -> EvolveResult<(f64, Vec<f64>)> {
        let state = self.ansatz.state(theta)?;
        let energy = problem.hamiltonian().expectation(&state)?;
        let observables = problem
            .aux_operators()
            .iter()
            .map(|(_, op)| op.expectation(&state))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((energy, observables))
    }

    /// Run the evolution and record every step.
    pub fn run(
        &self,
        problem: &TimeEvolutionProblem,
        initial_parameters: &[f64],
    ) -> EvolveResult<TimeEvolutionResult> {
        problem.validate()?;
        check_parameter_count(self.ansatz.num_parameters(), initial_parameters.len())?;
        if problem.hamiltonian().num_qubits() != self.ansatz.num_qubits() {
            return Err(qmetts_sim::SimError::DimensionMismatch {
                expected: self.ansatz.num_qubits(),
                got: problem.hamiltonian().num_qubits(),
            }
            .into());
        }

        let steps = self.config.num_steps(problem.time())?;
        let dt = problem.time() / steps as f64;
        let start = Instant::now();

        let names = problem
            .aux_operators()
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        let mut result = TimeEvolutionResult::new(names);
        let mut theta = initial_parameters.to_vec();
        let (energy, observables) = self.measure(problem, &theta)?;
        result.push(0.0, theta.clone(), energy, &observables);

        debug!(
            ansatz = self.ansatz.name(),
            principle = self.principle.name(),
            num_parameters = theta.len(),
            steps,
            dt,
            "Starting variational evolution"
        );

        for step in 0..steps {
            let mut conditions = Vec::with_capacity(self.config.ode.stages());
            let next = self.config.ode.step(&theta, dt, |point| {
                let (derivative, condition) =
                    self.parameter_derivative(problem.hamiltonian(), point)?;
                conditions.push(condition);
                Ok(derivative)
            })?;

            let condition = conditions.first().copied().unwrap_or(1.0);
            result.condition_numbers.push(condition);
            if condition.is_nan() || condition > self.config.condition_threshold {
                if self.config.fail_on_ill_conditioned {
                    return Err(EvolveError::IllConditioned { step, condition });
                }
                debug!(step, condition, "Ill-conditioned McLachlan metric");
                result.ill_conditioned_steps.push(step);
            }
            if next.iter().any(|v| !v.is_finite()) {
                return Err(EvolveError::NonFinite { step });
            }

            theta = next;
            let time = dt * (step + 1) as f64;
            let (energy, observables) = self.measure(problem, &theta)?;
            debug!(step, time, energy, condition, "Evolution step");
            result.push(time, theta.clone(), energy, &observables);
        }

        if let Some(&first) = result.ill_conditioned_steps.first() {
            warn!(
                count = result.ill_conditioned_steps.len(),
                first_step = first,
                threshold = self.config.condition_threshold,
                "Ill-conditioned McLachlan metric, singular directions were truncated"
            );
        }

        debug!(
            steps,
            final_energy = result.energies.last().copied().unwrap_or(f64::NAN),
            ill_conditioned = result.ill_conditioned_steps.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Variational evolution finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step_count() {
        let config = EvolverConfig::default();
        assert_eq!(config.num_steps(0.5).unwrap(), 50);
        assert_eq!(config.num_steps(0.0).unwrap(), 1);
        assert_eq!(config.num_steps(0.004).unwrap(), 1);
        assert_eq!(config.clone().with_num_timesteps(7).num_steps(3.0).unwrap(), 7);
    }

    #[test]
    fn test_invalid_step_settings() {
        assert!(EvolverConfig::default().with_num_timesteps(0).num_steps(1.0).is_err());
        assert!(EvolverConfig::default().with_step_size(0.0).num_steps(1.0).is_err());
    }

    #[test]
    fn test_config_defaults_from_empty_yaml_object() {
        let config: EvolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EvolverConfig::default());
    }
}
