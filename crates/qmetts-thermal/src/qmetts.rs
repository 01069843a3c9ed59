//! The QMETTS sampling driver.
//!
//! Every basis state is evolved once in imaginary time up to `β_max / 2`
//! and the whole trajectory is kept. For each point of the β grid the
//! driver then reads the evolved states at `τ = β / 2` off those
//! trajectories and walks a Markov chain: measure the current state in a
//! random product basis, jump to the collapsed product state, repeat. The
//! thermal average is the mean of `⟨O⟩` over the chain.

use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use qmetts_evolve::{ImaginaryTimeEvolver, TimeEvolutionProblem, TimeEvolutionResult, VarQite};
use qmetts_sim::{
    LabelFlag, MeasureLabel, PauliOperator, StateLabel, Statevector, choose_state, exp_value,
    generate_basis_list, generate_basis_measure_list,
};

use crate::error::{ThermalError, ThermalResult};
use crate::result::QmettsResults;

/// Smallest β of the grid; matches the default VarQITE step.
pub const MIN_BETA: f64 = 0.01;

fn default_final_beta() -> f64 {
    2.0
}

fn default_num_beta_points() -> usize {
    10
}

fn default_shots() -> usize {
    100
}

fn default_operators() -> Vec<String> {
    vec!["x".into(), "z".into()]
}

/// Sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QmettsConfig {
    /// Largest inverse temperature of the grid.
    #[serde(default = "default_final_beta")]
    pub final_beta: f64,
    /// Number of grid points between [`MIN_BETA`] and `final_beta`.
    #[serde(default = "default_num_beta_points")]
    pub num_beta_points: usize,
    /// Measurements per chain; a chain holds `shots + 1` states.
    #[serde(default = "default_shots")]
    pub shots: usize,
    /// First state of every chain. Defaults to all `0`.
    #[serde(default)]
    pub initial_state: Option<StateLabel>,
    /// Bases or product measurements, read according to `flag`.
    #[serde(default = "default_operators")]
    pub operators: Vec<String>,
    /// How `operators` is interpreted.
    #[serde(default)]
    pub flag: LabelFlag,
}

impl Default for QmettsConfig {
    fn default() -> Self {
        Self {
            final_beta: default_final_beta(),
            num_beta_points: default_num_beta_points(),
            shots: default_shots(),
            initial_state: None,
            operators: default_operators(),
            flag: LabelFlag::default(),
        }
    }
}

impl QmettsConfig {
    /// Set the β range.
    #[must_use]
    pub fn with_beta_grid(mut self, final_beta: f64, num_beta_points: usize) -> Self {
        self.final_beta = final_beta;
        self.num_beta_points = num_beta_points;
        self
    }

    /// Set the chain length.
    #[must_use]
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = shots;
        self
    }

    /// Set the first state of every chain.
    #[must_use]
    pub fn with_initial_state(mut self, label: StateLabel) -> Self {
        self.initial_state = Some(label);
        self
    }

    /// Set the measurement bases.
    #[must_use]
    pub fn with_operators(mut self, operators: Vec<String>, flag: LabelFlag) -> Self {
        self.operators = operators;
        self.flag = flag;
        self
    }

    /// Check ranges that do not depend on the system size.
    pub fn validate(&self) -> ThermalResult<()> {
        if !self.final_beta.is_finite() || self.final_beta < MIN_BETA {
            return Err(ThermalError::InvalidConfig(format!(
                "final_beta must be at least {MIN_BETA}, got {}",
                self.final_beta
            )));
        }
        if self.num_beta_points == 0 {
            return Err(ThermalError::InvalidConfig(
                "num_beta_points must be positive".into(),
            ));
        }
        if self.operators.is_empty() {
            return Err(ThermalError::InvalidConfig(
                "at least one measurement operator is required".into(),
            ));
        }
        Ok(())
    }
}

/// `n` evenly spaced points from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Imaginary-time trajectories of every basis state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preparation {
    /// Imaginary time every trajectory reaches.
    pub final_tau: f64,
    /// One trajectory per basis state.
    pub trajectories: BTreeMap<StateLabel, TimeEvolutionResult>,
}

impl Preparation {
    /// Trajectory of one basis state.
    pub fn get(&self, label: &StateLabel) -> ThermalResult<&TimeEvolutionResult> {
        self.trajectories
            .get(label)
            .ok_or_else(|| ThermalError::UnknownBasisState(label.to_string()))
    }

    /// Number of prepared basis states.
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    /// True if nothing was prepared.
    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }
}

/// One Markov chain at a fixed β.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QmettsChain {
    /// Inverse temperature, `2τ`.
    pub beta: f64,
    /// Imaginary time the states were evolved to.
    pub tau: f64,
    /// Visited product states, starting with the initial state.
    pub state_list: Vec<StateLabel>,
    /// Measurement used for each transition.
    pub measure_list: Vec<MeasureLabel>,
    /// `⟨O⟩` on the evolved version of each visited state.
    pub exp_value_list: Vec<f64>,
    /// Mean of `exp_value_list`.
    pub thermal_average: f64,
}

impl QmettsChain {
    /// Standard error of the mean, ignoring autocorrelation.
    pub fn standard_error(&self) -> f64 {
        let n = self.exp_value_list.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.thermal_average;
        let var = self
            .exp_value_list
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        (var / n as f64).sqrt()
    }
}

/// The evolved basis at one τ.
struct EvolvedBasis {
    states: FxHashMap<StateLabel, Statevector>,
    exp_values: FxHashMap<StateLabel, f64>,
}

impl EvolvedBasis {
    fn state(&self, label: &StateLabel) -> ThermalResult<&Statevector> {
        self.states
            .get(label)
            .ok_or_else(|| ThermalError::UnknownBasisState(label.to_string()))
    }

    fn exp_value(&self, label: &StateLabel) -> ThermalResult<f64> {
        self.exp_values
            .get(label)
            .copied()
            .ok_or_else(|| ThermalError::UnknownBasisState(label.to_string()))
    }
}

/// A configured QMETTS run over one Hamiltonian.
#[derive(Debug)]
pub struct QmettsInstance {
    hamiltonian: PauliOperator,
    evolver: VarQite,
    config: QmettsConfig,
    basis_list: Vec<StateLabel>,
    basis_measure_list: Vec<MeasureLabel>,
    initial_state: StateLabel,
}

impl QmettsInstance {
    /// Set up a run. The evolver's ansatz must match the Hamiltonian width.
    pub fn new(
        hamiltonian: PauliOperator,
        evolver: VarQite,
        config: QmettsConfig,
    ) -> ThermalResult<Self> {
        config.validate()?;
        let n = hamiltonian.num_qubits();
        if evolver.ansatz().num_qubits() != n {
            return Err(ThermalError::WidthMismatch {
                what: "ansatz",
                expected: n,
                got: evolver.ansatz().num_qubits(),
            });
        }

        let basis_list = generate_basis_list(n, &config.operators, config.flag)?;
        let basis_measure_list = generate_basis_measure_list(n, &config.operators, config.flag)?;

        let initial_state = match &config.initial_state {
            Some(label) => label.clone(),
            None => StateLabel::new("0".repeat(n))?,
        };
        if initial_state.num_qubits() != n {
            return Err(ThermalError::WidthMismatch {
                what: "initial state",
                expected: n,
                got: initial_state.num_qubits(),
            });
        }
        if !basis_list.contains(&initial_state) {
            return Err(ThermalError::UnknownBasisState(initial_state.to_string()));
        }

        Ok(Self {
            hamiltonian,
            evolver,
            config,
            basis_list,
            basis_measure_list,
            initial_state,
        })
    }

    /// Product states a chain can visit.
    pub fn basis_list(&self) -> &[StateLabel] {
        &self.basis_list
    }

    /// Product measurements a chain chooses from.
    pub fn basis_measure_list(&self) -> &[MeasureLabel] {
        &self.basis_measure_list
    }

    /// Sampled inverse temperatures, `linspace(0.01, β, k)`.
    pub fn beta_list(&self) -> Vec<f64> {
        linspace(MIN_BETA, self.config.final_beta, self.config.num_beta_points)
    }

    /// Imaginary times actually evolved to, `linspace(0.01, β/2, k)`.
    pub fn tau_list(&self) -> Vec<f64> {
        linspace(
            MIN_BETA,
            self.config.final_beta / 2.0,
            self.config.num_beta_points,
        )
    }

    /// Settings.
    pub fn config(&self) -> &QmettsConfig {
        &self.config
    }

    /// First state of every chain.
    pub fn initial_state(&self) -> &StateLabel {
        &self.initial_state
    }

    /// The Hamiltonian.
    pub fn hamiltonian(&self) -> &PauliOperator {
        &self.hamiltonian
    }

    /// Evolve one product state in imaginary time up to `tau`.
    pub fn evolve_basis_state(
        &self,
        label: &StateLabel,
        tau: f64,
    ) -> ThermalResult<TimeEvolutionResult> {
        let problem = TimeEvolutionProblem::new(self.hamiltonian.clone(), tau)?;
        let start = self.evolver.ansatz().product_state_parameters(label)?;
        Ok(self.evolver.evolve(&problem, &start)?)
    }

    /// Evolve every basis state to `β_max / 2`.
    pub fn prepare(&self) -> ThermalResult<Preparation> {
        self.prepare_with(|_, _| {})
    }

    /// Like [`prepare`](Self::prepare), calling `on_state(index, label)` after
    /// each basis state has been evolved.
    pub fn prepare_with<F>(&self, mut on_state: F) -> ThermalResult<Preparation>
    where
        F: FnMut(usize, &StateLabel),
    {
        let final_tau = self.config.final_beta / 2.0;
        let mut trajectories = BTreeMap::new();
        for (i, label) in self.basis_list.iter().enumerate() {
            let start = Instant::now();
            let trajectory = self.evolve_basis_state(label, final_tau)?;
            info!(
                state = %label,
                index = i + 1,
                total = self.basis_list.len(),
                steps = trajectory.num_steps(),
                final_energy = trajectory.energies.last().copied().unwrap_or(f64::NAN),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Evolved basis state"
            );
            trajectories.insert(label.clone(), trajectory);
            on_state(i, label);
        }
        Ok(Preparation {
            final_tau,
            trajectories,
        })
    }

    fn evolved_basis(
        &self,
        preparation: &Preparation,
        observable: &PauliOperator,
        tau: f64,
    ) -> ThermalResult<EvolvedBasis> {
        let mut states = FxHashMap::default();
        let mut exp_values = FxHashMap::default();
        for label in &self.basis_list {
            let trajectory = preparation.get(label)?;
            let params = trajectory
                .parameters_at_time(tau)
                .ok_or_else(|| ThermalError::UnknownBasisState(label.to_string()))?;
            let state = self.evolver.ansatz().state(params)?;
            exp_values.insert(label.clone(), exp_value(&state, observable)?);
            states.insert(label.clone(), state);
        }
        Ok(EvolvedBasis { states, exp_values })
    }

    fn walk<R: Rng + ?Sized>(
        &self,
        basis: &EvolvedBasis,
        tau: f64,
        rng: &mut R,
    ) -> ThermalResult<QmettsChain> {
        let shots = self.config.shots;
        let mut state_list = Vec::with_capacity(shots + 1);
        let mut measure_list = Vec::with_capacity(shots);
        state_list.push(self.initial_state.clone());

        for _ in 0..shots {
            let Some(current) = state_list.last() else {
                break;
            };
            let evolved = basis.state(current)?;
            let (measure, next) = choose_state(evolved, &self.basis_measure_list, rng)?;
            measure_list.push(measure);
            state_list.push(next);
        }

        let exp_value_list = state_list
            .iter()
            .map(|s| basis.exp_value(s))
            .collect::<ThermalResult<Vec<f64>>>()?;
        let thermal_average = exp_value_list.iter().sum::<f64>() / exp_value_list.len() as f64;

        Ok(QmettsChain {
            beta: 2.0 * tau,
            tau,
            state_list,
            measure_list,
            exp_value_list,
            thermal_average,
        })
    }

    /// One chain at imaginary time `tau` over an existing preparation.
    pub fn qmetts_chain<R: Rng + ?Sized>(
        &self,
        preparation: &Preparation,
        observable: &PauliOperator,
        tau: f64,
        rng: &mut R,
    ) -> ThermalResult<QmettsChain> {
        self.check_observable(observable)?;
        let basis = self.evolved_basis(preparation, observable, tau)?;
        self.walk(&basis, tau, rng)
    }

    /// Chains for every point of the τ grid.
    pub fn multi_beta_qmetts<R: Rng + ?Sized>(
        &self,
        preparation: Preparation,
        observable: &PauliOperator,
        rng: &mut R,
    ) -> ThermalResult<QmettsResults> {
        self.check_observable(observable)?;
        let mut chains = Vec::with_capacity(self.config.num_beta_points);
        let mut preparation_exp_values: BTreeMap<StateLabel, Vec<f64>> = self
            .basis_list
            .iter()
            .map(|l| (l.clone(), Vec::new()))
            .collect();

        for tau in self.tau_list() {
            let basis = self.evolved_basis(&preparation, observable, tau)?;
            for (label, values) in preparation_exp_values.iter_mut() {
                values.push(basis.exp_value(label)?);
            }
            let chain = self.walk(&basis, tau, rng)?;
            info!(
                beta = chain.beta,
                thermal_average = chain.thermal_average,
                "Sampled QMETTS chain"
            );
            chains.push(chain);
        }

        debug!(
            num_chains = chains.len(),
            shots = self.config.shots,
            "QMETTS sampling finished"
        );
        Ok(QmettsResults::new(
            self.hamiltonian.num_qubits(),
            chains,
            preparation,
            preparation_exp_values,
        ))
    }

    /// Prepare, then sample every β.
    pub fn run<R: Rng + ?Sized>(
        &self,
        observable: &PauliOperator,
        rng: &mut R,
    ) -> ThermalResult<QmettsResults> {
        self.check_observable(observable)?;
        let preparation = self.prepare()?;
        self.multi_beta_qmetts(preparation, observable, rng)
    }

    fn check_observable(&self, observable: &PauliOperator) -> ThermalResult<()> {
        if observable.num_qubits() == self.hamiltonian.num_qubits() {
            Ok(())
        } else {
            Err(ThermalError::WidthMismatch {
                what: "observable",
                expected: self.hamiltonian.num_qubits(),
                got: observable.num_qubits(),
            })
        }
    }
}
