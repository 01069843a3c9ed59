//! MHETS: thermal states by minimising the Helmholtz free energy.
//!
//! An ancilla register prepares a product distribution `p`, CX gates copy
//! it onto the system register, and a second ansatz rotates the system.
//! Tracing out the ancilla leaves `ρ_S = U (Σ p_i |i⟩⟨i|) U†`, whose entropy
//! is the Shannon entropy of `p`. Minimising
//!
//!   F(θ) = β Tr(ρ_S H) − S(p)
//!
//! over both parameter sets approaches the Gibbs state, where `F = −ln Z`.

use nalgebra::DMatrix;
use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::Instant;
use tracing::{debug, info};

use qmetts_evolve::Ansatz;
use qmetts_ir::{Circuit, ParameterValues, QubitId, bind_values};
use qmetts_sim::{PauliOperator, Statevector, shannon_entropy};

use crate::error::{ThermalError, ThermalResult};
use crate::optimizer::{AnyOptimizer, OptimizationResult, Optimizer, OptimizerKind};

fn default_maxiter() -> usize {
    1000
}

fn default_tol() -> f64 {
    1e-6
}

fn default_starting_points() -> usize {
    1
}

fn default_seed() -> u64 {
    42
}

/// Optimisation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MhetsConfig {
    /// Optimizer used for every β.
    #[serde(default)]
    pub optimizer: OptimizerKind,
    /// Iteration budget per optimisation.
    #[serde(default = "default_maxiter")]
    pub maxiter: usize,
    /// Optimizer tolerance.
    #[serde(default = "default_tol")]
    pub tol: f64,
    /// Starts per β for multi-start runs.
    #[serde(default = "default_starting_points")]
    pub n_starting_points: usize,
    /// Seed for stochastic optimizers.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for MhetsConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerKind::default(),
            maxiter: default_maxiter(),
            tol: default_tol(),
            n_starting_points: default_starting_points(),
            seed: default_seed(),
        }
    }
}

impl MhetsConfig {
    /// Set the optimizer and its budget.
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: OptimizerKind, maxiter: usize, tol: f64) -> Self {
        self.optimizer = optimizer;
        self.maxiter = maxiter;
        self.tol = tol;
        self
    }

    /// Set the number of starts per β.
    #[must_use]
    pub fn with_starting_points(mut self, n: usize) -> Self {
        self.n_starting_points = n;
        self
    }

    /// Check ranges.
    pub fn validate(&self) -> ThermalResult<()> {
        if self.maxiter == 0 {
            return Err(ThermalError::InvalidConfig("maxiter must be positive".into()));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(ThermalError::InvalidConfig(format!(
                "tol must be positive, got {}",
                self.tol
            )));
        }
        if self.n_starting_points == 0 {
            return Err(ThermalError::InvalidConfig(
                "n_starting_points must be positive".into(),
            ));
        }
        Ok(())
    }

    fn optimizer(&self) -> AnyOptimizer {
        AnyOptimizer::from_kind(self.optimizer, self.maxiter, self.tol, self.seed)
    }
}

/// Optimum found at one β.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MhetsPoint {
    /// Inverse temperature.
    pub beta: f64,
    /// Where the optimizer started.
    pub starting_point: Vec<f64>,
    /// Ancilla parameters followed by system parameters.
    pub parameters: Vec<f64>,
    /// `F = β⟨H⟩ − S`.
    pub free_energy: f64,
    /// `Tr(ρ_S H)`.
    pub energy: f64,
    /// Ancilla Shannon entropy.
    pub entropy: f64,
    /// Cost evaluations spent.
    pub num_evaluations: usize,
    /// Best `F` after each optimizer iteration.
    pub history: Vec<f64>,
    /// Wall time of the optimisation.
    pub elapsed_ms: u64,
}

/// Optima over a β grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MhetsRun {
    /// One point per β, in grid order.
    pub points: Vec<MhetsPoint>,
}

impl MhetsRun {
    /// β of every point.
    pub fn betas(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.beta).collect()
    }

    /// Free energy of every point.
    pub fn free_energies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.free_energy).collect()
    }

    /// Point at exactly `beta`, if solved.
    pub fn point(&self, beta: f64) -> Option<&MhetsPoint> {
        self.points.iter().find(|p| p.beta == beta)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no β was solved.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Output of [`Mhets::multi_start`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiStart {
    /// Lowest free energy over all starts.
    pub best: MhetsPoint,
    /// Every start, in order; the first one began at the initial parameters.
    pub runs: Vec<MhetsPoint>,
}

/// Purification circuit plus the cost it minimises.
///
/// Parameter vectors hold the ancilla parameters first, then the system
/// parameters.
#[derive(Debug)]
pub struct Mhets {
    hamiltonian: PauliOperator,
    system_hamiltonian: PauliOperator,
    ancilla: Box<dyn Ansatz>,
    system: Box<dyn Ansatz>,
    circuit: Circuit,
    parameter_names: Vec<String>,
    system_par_name: String,
    initial_parameters: Vec<f64>,
    config: MhetsConfig,
}

impl Mhets {
    /// Assemble the purification circuit.
    ///
    /// Both ansätze must be as wide as the Hamiltonian. If they share a
    /// parameter prefix the system prefix is doubled (`x` becomes `xx`).
    pub fn new(
        hamiltonian: PauliOperator,
        ancilla: Box<dyn Ansatz>,
        system: Box<dyn Ansatz>,
        config: MhetsConfig,
    ) -> ThermalResult<Self> {
        config.validate()?;
        let n = hamiltonian.num_qubits();
        let widths = [
            ("ancilla ansatz", ancilla.num_qubits()),
            ("system ansatz", system.num_qubits()),
        ];
        for (what, width) in widths {
            if width != n {
                return Err(ThermalError::WidthMismatch {
                    what,
                    expected: n,
                    got: width,
                });
            }
        }

        let mut system_circuit = system.circuit().clone();
        let mut system_names = system.parameter_names().to_vec();
        let mut system_par_name = system.par_name().to_string();
        if ancilla.par_name() == system.par_name() {
            let old = system.par_name();
            system_par_name = format!("{old}{old}");
            for name in &mut system_names {
                let suffix = name.strip_prefix(old).unwrap_or(name.as_str());
                let renamed = format!("{system_par_name}{suffix}");
                system_circuit = system_circuit.rename_parameter(name.as_str(), &renamed);
                *name = renamed;
            }
            info!(
                par_name = %system_par_name,
                "Renamed system ansatz parameters"
            );
        }

        let mut parameter_names = ancilla.parameter_names().to_vec();
        parameter_names.extend(system_names);
        let mut seen = parameter_names.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != parameter_names.len() {
            return Err(ThermalError::InvalidConfig(
                "ancilla and system ansätze share parameter names".into(),
            ));
        }

        let width = 2 * n as u32;
        let mut circuit = Circuit::with_size("mhets", width);
        circuit.compose(ancilla.circuit(), 0)?;
        for q in 0..n as u32 {
            circuit.cx(QubitId(q), QubitId(q + n as u32))?;
        }
        circuit.compose(&system_circuit, n as u32)?;

        let system_hamiltonian = hamiltonian.embed(n as u32, width)?;
        let initial_parameters = vec![0.0; parameter_names.len()];

        debug!(
            num_qubits = width,
            num_parameters = parameter_names.len(),
            depth = circuit.depth(),
            "Built MHETS circuit"
        );

        Ok(Self {
            hamiltonian,
            system_hamiltonian,
            ancilla,
            system,
            circuit,
            parameter_names,
            system_par_name,
            initial_parameters,
            config,
        })
    }

    /// Start from `parameters` instead of all zeros.
    pub fn with_initial_parameters(mut self, parameters: Vec<f64>) -> ThermalResult<Self> {
        self.check_parameters(&parameters)?;
        self.initial_parameters = parameters;
        Ok(self)
    }

    /// System width `N`; the circuit uses `2N` qubits.
    pub fn num_qubits(&self) -> usize {
        self.hamiltonian.num_qubits()
    }

    /// Length of a parameter vector.
    pub fn num_parameters(&self) -> usize {
        self.parameter_names.len()
    }

    /// Parameters belonging to the ancilla ansatz.
    pub fn num_ancilla_parameters(&self) -> usize {
        self.ancilla.num_parameters()
    }

    /// Parameter names, ancilla first.
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Prefix used for the system parameters after disambiguation.
    pub fn system_par_name(&self) -> &str {
        &self.system_par_name
    }

    /// The full `2N`-qubit circuit.
    pub fn total_circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Default starting point.
    pub fn initial_parameters(&self) -> &[f64] {
        &self.initial_parameters
    }

    /// Settings.
    pub fn config(&self) -> &MhetsConfig {
        &self.config
    }

    /// The system ansatz.
    pub fn system_ansatz(&self) -> &dyn Ansatz {
        self.system.as_ref()
    }

    fn check_parameters(&self, parameters: &[f64]) -> ThermalResult<()> {
        if parameters.len() == self.num_parameters() {
            Ok(())
        } else {
            Err(ThermalError::ParameterCountMismatch {
                expected: self.num_parameters(),
                got: parameters.len(),
            })
        }
    }

    fn bind(&self, parameters: &[f64]) -> ThermalResult<ParameterValues> {
        self.check_parameters(parameters)?;
        Ok(bind_values(&self.parameter_names, parameters))
    }

    /// Purified state on `2N` qubits.
    pub fn state(&self, parameters: &[f64]) -> ThermalResult<Statevector> {
        let values = self.bind(parameters)?;
        let mut state = Statevector::new(self.circuit.num_qubits());
        state.evolve(&self.circuit, &values)?;
        Ok(state)
    }

    /// `(Tr(ρ_S H), S(p_ancilla))`.
    pub fn cost_terms(&self, parameters: &[f64]) -> ThermalResult<(f64, f64)> {
        let state = self.state(parameters)?;
        let ancilla: Vec<usize> = (0..self.num_qubits()).collect();
        let p = state.marginal_probabilities(&ancilla)?;
        let energy = self.system_hamiltonian.expectation(&state)?;
        Ok((energy, shannon_entropy(&p)))
    }

    /// `F(θ) = β Tr(ρ_S H) − S`.
    pub fn cost(&self, beta: f64, parameters: &[f64]) -> ThermalResult<f64> {
        let (energy, entropy) = self.cost_terms(parameters)?;
        Ok(beta * energy - entropy)
    }

    /// `ρ_S`, the system register with the ancilla traced out.
    pub fn reduced_system_state(&self, parameters: &[f64]) -> ThermalResult<DMatrix<Complex64>> {
        let state = self.state(parameters)?;
        let n = self.num_qubits();
        let system: Vec<usize> = (n..2 * n).collect();
        Ok(state.reduced_density_matrix(&system)?)
    }

    /// Minimise `F` at one β, from `guess` or the initial parameters.
    pub fn optimize(&self, beta: f64, guess: Option<&[f64]>) -> ThermalResult<MhetsPoint> {
        if !(beta.is_finite() && beta >= 0.0) {
            return Err(ThermalError::InvalidConfig(format!("invalid beta {beta}")));
        }
        let start_point = guess.unwrap_or(&self.initial_parameters).to_vec();
        self.check_parameters(&start_point)?;

        let start = Instant::now();
        let mut failure: Option<ThermalError> = None;
        let OptimizationResult {
            optimal_params,
            num_evaluations,
            history,
            ..
        } = self.config.optimizer().minimize(
            |theta| match self.cost(beta, theta) {
                Ok(f) => f,
                Err(e) => {
                    failure.get_or_insert(e);
                    f64::NAN
                }
            },
            start_point.clone(),
        );
        if let Some(e) = failure {
            return Err(e);
        }

        let (energy, entropy) = self.cost_terms(&optimal_params)?;
        let point = MhetsPoint {
            beta,
            starting_point: start_point,
            parameters: optimal_params,
            free_energy: beta * energy - entropy,
            energy,
            entropy,
            num_evaluations,
            history,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            beta,
            free_energy = point.free_energy,
            energy,
            entropy,
            evaluations = num_evaluations,
            elapsed_ms = point.elapsed_ms,
            "MHETS optimisation finished"
        );
        Ok(point)
    }

    /// Solve each β in turn, warm-starting from the previous optimum.
    pub fn multi_beta_from_scratch(&self, betas: &[f64]) -> ThermalResult<MhetsRun> {
        let mut run = MhetsRun::default();
        for &beta in betas {
            let guess = run.points.last().map(|p| p.parameters.clone());
            let point = self.optimize(beta, guess.as_deref())?;
            run.points.push(point);
        }
        Ok(run)
    }

    /// Like [`Self::multi_beta_from_scratch`], but βs already solved in
    /// `old` are copied instead of recomputed.
    pub fn multi_beta_from_data(&self, betas: &[f64], old: &MhetsRun) -> ThermalResult<MhetsRun> {
        let mut run = MhetsRun::default();
        for &beta in betas {
            if let Some(point) = old.point(beta) {
                debug!(beta, "Reusing stored MHETS optimum");
                run.points.push(point.clone());
                continue;
            }
            let guess = run.points.last().map(|p| p.parameters.clone());
            let point = self.optimize(beta, guess.as_deref())?;
            run.points.push(point);
        }
        Ok(run)
    }

    /// Optimise from `n` starts and keep the lowest `F`.
    ///
    /// The first start is the initial parameter vector, the others are
    /// uniform in `[−π, π]`.
    pub fn multi_start<R: Rng + ?Sized>(
        &self,
        beta: f64,
        n: usize,
        rng: &mut R,
    ) -> ThermalResult<MultiStart> {
        let n = n.max(1);
        let mut runs = Vec::with_capacity(n);
        runs.push(self.optimize(beta, None)?);
        for _ in 1..n {
            let start: Vec<f64> = (0..self.num_parameters())
                .map(|_| rng.gen_range(-PI..=PI))
                .collect();
            runs.push(self.optimize(beta, Some(&start))?);
        }
        let best = runs
            .iter()
            .min_by(|a, b| a.free_energy.total_cmp(&b.free_energy))
            .cloned()
            .ok_or_else(|| ThermalError::InvalidConfig("no starting points".into()))?;
        Ok(MultiStart { best, runs })
    }

    /// [`Self::multi_start`] on every β.
    ///
    /// Returns the best point per β and, for each start index, the run it
    /// produced across the grid.
    pub fn multi_beta_multi_start<R: Rng + ?Sized>(
        &self,
        betas: &[f64],
        rng: &mut R,
    ) -> ThermalResult<(MhetsRun, Vec<MhetsRun>)> {
        let n = self.config.n_starting_points.max(1);
        let mut best = MhetsRun::default();
        let mut per_start = vec![MhetsRun::default(); n];
        for &beta in betas {
            let MultiStart { best: point, runs } = self.multi_start(beta, n, rng)?;
            best.points.push(point);
            for (slot, run) in per_start.iter_mut().zip(runs) {
                slot.points.push(run);
            }
        }
        Ok((best, per_start))
    }
}

/// Insert the midpoint between each pair of neighbouring βs.
pub fn refine_betas(betas: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(betas.len() * 2);
    for pair in betas.windows(2) {
        out.push(pair[0]);
        out.push(0.5 * (pair[0] + pair[1]));
    }
    if let Some(last) = betas.last() {
        out.push(*last);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refine_betas() {
        assert_eq!(refine_betas(&[0.0, 1.0, 3.0]), vec![0.0, 0.5, 1.0, 2.0, 3.0]);
        assert_eq!(refine_betas(&[2.0]), vec![2.0]);
        assert!(refine_betas(&[]).is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(MhetsConfig::default().validate().is_ok());
        let bad = MhetsConfig::default().with_starting_points(0);
        assert!(matches!(bad.validate(), Err(ThermalError::InvalidConfig(_))));
        let bad = MhetsConfig::default().with_optimizer(OptimizerKind::Spsa, 0, 1e-3);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_run_lookup() {
        let point = |beta| MhetsPoint {
            beta,
            starting_point: vec![],
            parameters: vec![],
            free_energy: -beta,
            energy: 0.0,
            entropy: 0.0,
            num_evaluations: 0,
            history: vec![],
            elapsed_ms: 0,
        };
        let run = MhetsRun {
            points: vec![point(0.5), point(1.0)],
        };
        assert_eq!(run.betas(), vec![0.5, 1.0]);
        assert!(run.point(1.0).is_some());
        assert!(run.point(0.75).is_none());
        assert_eq!(run.free_energies(), vec![-0.5, -1.0]);
    }
}
