//! Error types for the thermal crate.

use thiserror::Error;

/// Errors produced by QMETTS sampling and MHETS minimisation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ThermalError {
    /// Time evolution failed.
    #[error("Evolution error: {0}")]
    Evolve(#[from] qmetts_evolve::EvolveError),

    /// Simulation or label error.
    #[error("Simulation error: {0}")]
    Sim(#[from] qmetts_sim::SimError),

    /// Circuit assembly failed.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qmetts_ir::IrError),

    /// Settings are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A chain reached a state that was never prepared.
    #[error("State '{0}' is not in the prepared basis")]
    UnknownBasisState(String),

    /// Two registers that must have equal width do not.
    #[error("Width mismatch: {what} has {got} qubits, expected {expected}")]
    WidthMismatch {
        /// Which register.
        what: &'static str,
        /// Required width.
        expected: usize,
        /// Actual width.
        got: usize,
    },

    /// Parameter vector does not match the circuit.
    #[error("Expected {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Parameters the circuit declares.
        expected: usize,
        /// Parameters supplied.
        got: usize,
    },
}

/// Result type for thermal-state operations.
pub type ThermalResult<T> = Result<T, ThermalError>;
