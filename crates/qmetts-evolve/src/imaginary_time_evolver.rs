//! Evolver interfaces.

use crate::error::EvolveResult;
use crate::problem::TimeEvolutionProblem;
use crate::result::TimeEvolutionResult;

/// Approximates `e^{-τH}|ψ₀⟩ / ‖·‖` up to `τ = problem.time()`.
pub trait ImaginaryTimeEvolver {
    /// Evolve from `initial_parameters`. The problem is not modified.
    fn evolve(
        &self,
        problem: &TimeEvolutionProblem,
        initial_parameters: &[f64],
    ) -> EvolveResult<TimeEvolutionResult>;
}

/// Approximates `e^{-itH}|ψ₀⟩` up to `t = problem.time()`.
pub trait RealTimeEvolver {
    /// Evolve from `initial_parameters`. The problem is not modified.
    fn evolve(
        &self,
        problem: &TimeEvolutionProblem,
        initial_parameters: &[f64],
    ) -> EvolveResult<TimeEvolutionResult>;
}
