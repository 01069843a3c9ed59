//! Error types for the evolve crate.

use thiserror::Error;

/// Errors produced by ansatz construction and variational time evolution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvolveError {
    /// Simulation or operator error.
    #[error("Simulation error: {0}")]
    Sim(#[from] qmetts_sim::SimError),

    /// Circuit builder or parameter evaluation failed.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qmetts_ir::IrError),

    /// Parameter vector does not match the ansatz.
    #[error("Ansatz has {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Parameters the ansatz declares.
        expected: usize,
        /// Parameters supplied.
        got: usize,
    },

    /// Evolution time must be finite and non-negative.
    #[error("Evolution time must be finite and non-negative, got {0}")]
    InvalidTime(f64),

    /// A step count or step size that cannot reach the target time.
    #[error("Invalid step configuration: {0}")]
    InvalidSteps(String),

    /// The McLachlan metric was too ill-conditioned to trust the update.
    #[error("Ill-conditioned metric at step {step}: condition number {condition:.3e}")]
    IllConditioned {
        /// Zero-based step index.
        step: usize,
        /// Condition number of the metric.
        condition: f64,
    },

    /// The parameter update contained NaN or infinity.
    #[error("Non-finite parameter update at step {step}")]
    NonFinite {
        /// Zero-based step index.
        step: usize,
    },

    /// The linear system for the parameter derivatives could not be solved.
    #[error("Linear solve failed: {0}")]
    Solver(String),

    /// Ansatz options are inconsistent.
    #[error("Invalid ansatz: {0}")]
    InvalidAnsatz(String),

    /// The ansatz cannot prepare the requested product state.
    #[error("Ansatz '{ansatz}' cannot prepare product state '{label}'")]
    UnsupportedProductState {
        /// Ansatz name.
        ansatz: String,
        /// Requested label.
        label: String,
    },
}

/// Result type for evolution operations.
pub type EvolveResult<T> = Result<T, EvolveError>;
