//! Error types for the sim crate.

use thiserror::Error;

/// Errors produced by operator construction, simulation and diagonalization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Operator contains no terms.
    #[error("Operator is empty: no Pauli terms")]
    EmptyOperator,

    /// A Pauli string references a qubit index that is out of range.
    #[error("Pauli string references qubit {qubit} but the register only has {n_qubits} qubits")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: u32,
        /// Width of the register.
        n_qubits: u32,
    },

    /// A label contains characters outside its alphabet or has the wrong width.
    #[error("Invalid label '{label}': {reason}")]
    InvalidLabel {
        /// The rejected label.
        label: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two objects that must share a register width do not.
    #[error("Dimension mismatch: expected {expected} qubits, got {got}")]
    DimensionMismatch {
        /// Expected width.
        expected: usize,
        /// Provided width.
        got: usize,
    },

    /// Amplitude vector length is not a power of two.
    #[error("Amplitude vector of length {0} is not a power of two")]
    InvalidAmplitudes(usize),

    /// A state with zero norm cannot be normalized or sampled.
    #[error("State has zero norm")]
    ZeroNorm,

    /// Inverse temperature must be finite and non-negative.
    #[error("Inverse temperature must be finite and non-negative, got {0}")]
    InvalidBeta(f64),

    /// Matrix passed to the eigensolver is not square.
    #[error("Matrix must be square, got {rows}x{cols}")]
    NonSquareMatrix {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },

    /// Circuit builder or parameter evaluation failed.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qmetts_ir::IrError),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
