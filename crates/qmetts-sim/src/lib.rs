//! `qmetts-sim`: statevector simulation and exact references for QMETTS.
//!
//! Provides what the variational evolvers and thermal samplers run on:
//!
//! - **Pauli operators** ([`PauliString`], [`PauliOperator`]) with dense
//!   labels, qubit 0 rightmost
//! - **LMG model** ([`LmgModel`]) building the Hamiltonian and magnetisations
//! - **Statevector** simulation of [`qmetts_ir::Circuit`]s, sampling and
//!   reduced density matrices
//! - **Product labels** ([`StateLabel`], [`MeasureLabel`]) and the random
//!   product measurement at the heart of a METTS chain
//! - **Exact diagonalization** ([`Spectrum`]) for Gibbs-state reference values
//!
//! # Quick start
//!
//! ```rust
//! use qmetts_sim::{LmgModel, Statevector};
//!
//! let model = LmgModel::new(3, 0.5, 1.0).unwrap();
//! let h = model.hamiltonian().unwrap();
//!
//! // All spins up: only the field contributes.
//! let state = Statevector::from_label("000").unwrap();
//! let e = h.expectation(&state).unwrap();
//! assert!((e + 3.0).abs() < 1e-12);
//!
//! let e0 = model.spectrum().unwrap().ground_energy();
//! assert!(e0 <= e);
//! ```

pub mod error;
pub mod exact;
pub mod label;
pub mod lmg;
pub mod operator;
pub mod pauli;
pub mod statevector;

pub use error::{SimError, SimResult};
pub use exact::{Spectrum, relative_entropy, shannon_entropy, von_neumann_entropy};
pub use label::{
    BasisOp, LabelFlag, MeasureLabel, StateLabel, choose_state, exp_value,
    generate_basis_list, generate_basis_measure_list, z_to_x_state_label,
};
pub use lmg::LmgModel;
pub use operator::{PauliOperator, PauliTerm};
pub use pauli::{PauliOp, PauliString, rotation_generator};
pub use statevector::Statevector;
