//! Variational imaginary-time evolution.

use crate::error::EvolveResult;
use crate::imaginary_time_evolver::ImaginaryTimeEvolver;
use crate::principle::ImaginaryMcLachlan;
use crate::problem::TimeEvolutionProblem;
use crate::result::TimeEvolutionResult;
use crate::var_qte::VarQte;

/// VarQITE: [`VarQte`] under the imaginary-time McLachlan principle.
///
/// ```rust
/// use qmetts_evolve::{
///     Ansatz, EvolverConfig, ImaginaryTimeEvolver, TimeEvolutionProblem, TwoLocal,
///     TwoLocalConfig, VarQite,
/// };
/// use qmetts_sim::{LmgModel, StateLabel};
///
/// let h = LmgModel::new(2, 0.0, 0.5).unwrap().hamiltonian().unwrap();
/// let ansatz = TwoLocal::new(2, TwoLocalConfig::default()).unwrap();
/// let start = ansatz.product_state_parameters(&StateLabel::new("++").unwrap()).unwrap();
///
/// let qite = VarQite::new(Box::new(ansatz))
///     .with_config(EvolverConfig::default().with_num_timesteps(10));
/// let problem = TimeEvolutionProblem::new(h, 0.5).unwrap();
/// let result = qite.evolve(&problem, &start).unwrap();
///
/// assert_eq!(result.len(), 11);
/// assert!(result.energies[10] <= result.energies[0] + 1e-9);
/// ```
pub type VarQite = VarQte<ImaginaryMcLachlan>;

impl ImaginaryTimeEvolver for VarQte<ImaginaryMcLachlan> {
    fn evolve(
        &self,
        problem: &TimeEvolutionProblem,
        initial_parameters: &[f64],
    ) -> EvolveResult<TimeEvolutionResult> {
        self.run(problem, initial_parameters)
    }
}
