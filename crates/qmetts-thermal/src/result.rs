//! Collected output of a QMETTS run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use qmetts_sim::StateLabel;

use crate::qmetts::{Preparation, QmettsChain};

/// Chains for every β plus the preparation they were drawn from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QmettsResults {
    /// Register width.
    pub num_qubits: usize,
    /// One chain per β, in grid order.
    pub chains: Vec<QmettsChain>,
    /// Basis-state trajectories up to `β_max / 2`.
    pub preparation: Preparation,
    /// `⟨O⟩` on each evolved basis state, one entry per β.
    pub preparation_exp_values: BTreeMap<StateLabel, Vec<f64>>,
}

impl QmettsResults {
    /// Bundle the output of a run.
    pub fn new(
        num_qubits: usize,
        chains: Vec<QmettsChain>,
        preparation: Preparation,
        preparation_exp_values: BTreeMap<StateLabel, Vec<f64>>,
    ) -> Self {
        Self {
            num_qubits,
            chains,
            preparation,
            preparation_exp_values,
        }
    }

    /// β of every chain.
    pub fn beta_list(&self) -> Vec<f64> {
        self.chains.iter().map(|c| c.beta).collect()
    }

    /// Thermal average of every chain.
    pub fn thermal_averages(&self) -> Vec<f64> {
        self.chains.iter().map(|c| c.thermal_average).collect()
    }

    /// Standard error of every chain.
    pub fn standard_errors(&self) -> Vec<f64> {
        self.chains.iter().map(QmettsChain::standard_error).collect()
    }

    /// Visited states of every chain.
    pub fn total_state_list(&self) -> Vec<&[StateLabel]> {
        self.chains.iter().map(|c| c.state_list.as_slice()).collect()
    }

    /// How often each state was visited in chain `index`.
    pub fn state_histogram(&self, index: usize) -> Option<BTreeMap<StateLabel, usize>> {
        let chain = self.chains.get(index)?;
        let mut counts = BTreeMap::new();
        for state in &chain.state_list {
            *counts.entry(state.clone()).or_insert(0) += 1;
        }
        Some(counts)
    }

    /// Per-β histograms.
    pub fn state_histograms(&self) -> Vec<BTreeMap<StateLabel, usize>> {
        (0..self.chains.len())
            .filter_map(|i| self.state_histogram(i))
            .collect()
    }

    /// `(β, ⟨O⟩)` pairs.
    pub fn curve(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.chains.iter().map(|c| (c.beta, c.thermal_average))
    }
}
