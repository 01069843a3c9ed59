//! QMETTS Circuit Representation
//!
//! Data structures for the parameterised circuits that the rest of the
//! workspace evolves, simulates and measures.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`]; qubit `i` is bit `i` of a basis index
//! - **Gates**: [`StandardGate`], including the `RXY`/`RYX` blocks of the
//!   physically-motivated ansatz
//! - **Parameters**: [`ParameterExpression`] with evaluation and symbolic
//!   derivatives
//! - **Instructions**: [`Instruction`] combining gates with their operands
//! - **Circuit**: [`Circuit`] builder in program order
//!
//! # Example: Parameterized Circuit
//!
//! ```rust
//! use qmetts_ir::{bind_values, Circuit, ParameterExpression, QubitId};
//!
//! let mut circuit = Circuit::with_size("variational", 2);
//! circuit
//!     .ry(ParameterExpression::symbol("x_0"), QubitId(0))
//!     .unwrap()
//!     .cx(QubitId(0), QubitId(1))
//!     .unwrap();
//!
//! let names = circuit.parameters();
//! let bound = circuit
//!     .assign_parameters(&bind_values(&names, &[std::f64::consts::FRAC_PI_2]))
//!     .unwrap();
//! assert!(!bound.is_parameterized());
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `I`, `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `H`, `S`, `Sdg` | 1 | Clifford gates |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `CX`, `CZ` | 2 | Controlled gates |
//! | `RXY`, `RYX` | 2 | `exp(-iθ/2 · XY)`, `exp(-iθ/2 · YX)` |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use parameter::{ParameterExpression, ParameterValues, bind_values};
pub use qubit::QubitId;
