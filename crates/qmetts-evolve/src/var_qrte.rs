//! Variational real-time evolution.

use crate::error::EvolveResult;
use crate::imaginary_time_evolver::RealTimeEvolver;
use crate::principle::RealMcLachlan;
use crate::problem::TimeEvolutionProblem;
use crate::result::TimeEvolutionResult;
use crate::var_qte::VarQte;

/// VarQRTE: [`VarQte`] under the real-time McLachlan principle.
pub type VarQrte = VarQte<RealMcLachlan>;

impl RealTimeEvolver for VarQte<RealMcLachlan> {
    fn evolve(
        &self,
        problem: &TimeEvolutionProblem,
        initial_parameters: &[f64],
    ) -> EvolveResult<TimeEvolutionResult> {
        self.run(problem, initial_parameters)
    }
}
