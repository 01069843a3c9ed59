//! Recorded trajectory of a variational time evolution.

use serde::{Deserialize, Serialize};

/// Per-step record of a variational evolution.
///
/// Entry 0 is the initial point at `t = 0`; every step appends one entry and
/// nothing is rewritten. `condition_numbers[k]` belongs to the step that
/// produced entry `k + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeEvolutionResult {
    /// Time of each entry.
    pub times: Vec<f64>,
    /// Parameter vector of each entry.
    pub parameter_values: Vec<Vec<f64>>,
    /// `⟨H⟩` of each entry.
    pub energies: Vec<f64>,
    /// Names of the recorded auxiliary operators.
    pub observable_names: Vec<String>,
    /// `observables[j][k]` is auxiliary operator `j` at entry `k`.
    pub observables: Vec<Vec<f64>>,
    /// Condition number of the metric used by each step.
    pub condition_numbers: Vec<f64>,
    /// Steps whose metric exceeded the condition threshold.
    pub ill_conditioned_steps: Vec<usize>,
}

impl TimeEvolutionResult {
    /// Empty record for the named auxiliary operators.
    pub fn new(observable_names: Vec<String>) -> Self {
        let observables = vec![Vec::new(); observable_names.len()];
        Self {
            observable_names,
            observables,
            ..Self::default()
        }
    }

    /// Append one entry.
    pub fn push(&mut self, time: f64, parameters: Vec<f64>, energy: f64, observables: &[f64]) {
        self.times.push(time);
        self.parameter_values.push(parameters);
        self.energies.push(energy);
        for (trajectory, value) in self.observables.iter_mut().zip(observables) {
            trajectory.push(*value);
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of steps taken.
    pub fn num_steps(&self) -> usize {
        self.len().saturating_sub(1)
    }

    /// Parameters of the last entry.
    pub fn final_parameters(&self) -> Option<&[f64]> {
        self.parameter_values.last().map(Vec::as_slice)
    }

    /// Time of the last entry.
    pub fn final_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Index of the entry closest in time to `t`. Ties go to the earlier entry.
    pub fn index_of_time(&self, t: f64) -> Option<usize> {
        self.times
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - t).abs().total_cmp(&(*b - t).abs()))
            .map(|(i, _)| i)
    }

    /// Parameters of the entry closest to `t`.
    pub fn parameters_at_time(&self, t: f64) -> Option<&[f64]> {
        self.index_of_time(t)
            .map(|i| self.parameter_values[i].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TimeEvolutionResult {
        let mut result = TimeEvolutionResult::new(vec!["m".into()]);
        for k in 0..5 {
            let t = 0.1 * k as f64;
            result.push(t, vec![t], -t, &[2.0 * t]);
            if k > 0 {
                result.condition_numbers.push(1.0);
            }
        }
        result.ill_conditioned_steps.push(3);
        result
    }

    #[test]
    fn test_nearest_time() {
        let result = sample();
        assert_eq!(result.index_of_time(0.26), Some(3));
        assert_eq!(result.index_of_time(-1.0), Some(0));
        assert_eq!(result.index_of_time(9.0), Some(4));
        assert_eq!(result.parameters_at_time(0.11), Some(&[0.1][..]));
    }

    #[test]
    fn test_empty() {
        let result = TimeEvolutionResult::new(vec![]);
        assert!(result.is_empty());
        assert_eq!(result.index_of_time(0.0), None);
        assert_eq!(result.final_parameters(), None);
    }
}
