//! Time-evolution problem definition.

use qmetts_sim::PauliOperator;

use crate::error::{EvolveError, EvolveResult};

/// What to evolve and for how long.
///
/// `time` is imaginary time τ for [`crate::VarQite`] and real time for
/// [`crate::VarQrte`]. Auxiliary operators are evaluated on every recorded
/// state alongside the energy. The evolvers only borrow the problem.
#[derive(Debug, Clone)]
pub struct TimeEvolutionProblem {
    hamiltonian: PauliOperator,
    time: f64,
    aux_operators: Vec<(String, PauliOperator)>,
}

impl TimeEvolutionProblem {
    /// Create a problem, validating the time and Hamiltonian.
    pub fn new(hamiltonian: PauliOperator, time: f64) -> EvolveResult<Self> {
        let problem = Self {
            hamiltonian,
            time,
            aux_operators: Vec::new(),
        };
        problem.validate()?;
        Ok(problem)
    }

    /// Record `operator` under `name` at every step.
    #[must_use]
    pub fn with_aux_operator(mut self, name: impl Into<String>, operator: PauliOperator) -> Self {
        self.aux_operators.push((name.into(), operator));
        self
    }

    /// Check time and operator widths.
    pub fn validate(&self) -> EvolveResult<()> {
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(EvolveError::InvalidTime(self.time));
        }
        if self.hamiltonian.is_empty() {
            return Err(qmetts_sim::SimError::EmptyOperator.into());
        }
        for (_, op) in &self.aux_operators {
            if op.num_qubits() != self.hamiltonian.num_qubits() {
                return Err(qmetts_sim::SimError::DimensionMismatch {
                    expected: self.hamiltonian.num_qubits(),
                    got: op.num_qubits(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// The generator of the evolution.
    pub fn hamiltonian(&self) -> &PauliOperator {
        &self.hamiltonian
    }

    /// Target time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Named auxiliary operators.
    pub fn aux_operators(&self) -> &[(String, PauliOperator)] {
        &self.aux_operators
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h() -> PauliOperator {
        PauliOperator::from_list(&[("ZZ", 1.0)]).unwrap()
    }

    #[test]
    fn test_rejects_negative_time() {
        assert!(matches!(
            TimeEvolutionProblem::new(h(), -0.1),
            Err(EvolveError::InvalidTime(_))
        ));
        assert!(TimeEvolutionProblem::new(h(), f64::INFINITY).is_err());
    }

    #[test]
    fn test_aux_width_checked() {
        let aux = PauliOperator::from_list(&[("Z", 1.0)]).unwrap();
        let problem = TimeEvolutionProblem::new(h(), 1.0)
            .unwrap()
            .with_aux_operator("z", aux);
        assert!(problem.validate().is_err());
    }
}
