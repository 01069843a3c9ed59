//! `qmetts-evolve`: variational time evolution of parameterised ansätze.
//!
//! Projects imaginary-time (VarQITE) or real-time (VarQRTE) evolution onto
//! the tangent space of an ansatz with McLachlan's variational principle:
//!
//! - **Ansätze**: [`TwoLocal`] and the parity-preserving
//!   [`PhysicallyMotivated`] circuit, selected at runtime via [`AnsatzConfig`]
//! - **Tangent states**: exact `∂_k|ψ(θ)⟩` by generator insertion
//! - **Principles**: [`ImaginaryMcLachlan`], [`RealMcLachlan`]
//! - **Solver**: truncated-SVD solve of `(A + λI) θ̇ = C` with condition
//!   tracking
//! - **Integrators**: forward Euler and RK4
//!
//! # Quick start
//!
//! ```rust
//! use qmetts_evolve::{
//!     Ansatz, AnsatzConfig, EvolverConfig, ImaginaryTimeEvolver, TimeEvolutionProblem, VarQite,
//! };
//! use qmetts_sim::{LmgModel, StateLabel};
//!
//! let model = LmgModel::new(2, 0.0, 1.0).unwrap();
//! let ansatz = AnsatzConfig::default().build(2).unwrap();
//! let start = ansatz.product_state_parameters(&StateLabel::new("+-").unwrap()).unwrap();
//!
//! let problem = TimeEvolutionProblem::new(model.hamiltonian().unwrap(), 0.1).unwrap();
//! let qite = VarQite::new(ansatz).with_config(EvolverConfig::default());
//! let result = qite.evolve(&problem, &start).unwrap();
//! assert_eq!(result.num_steps(), 10);
//! ```

pub mod ansatz;
pub mod error;
pub mod gradient;
pub mod imaginary_time_evolver;
pub mod ode;
pub mod principle;
pub mod problem;
pub mod result;
pub mod solver;
pub mod var_qite;
pub mod var_qrte;
pub mod var_qte;

pub use ansatz::{
    Ansatz, AnsatzConfig, Entanglement, EntanglementBlock, PhysicallyMotivated, PmaConfig,
    RotationBlock, TwoLocal, TwoLocalConfig,
};
pub use error::{EvolveError, EvolveResult};
pub use gradient::{TangentStates, tangent_states};
pub use imaginary_time_evolver::{ImaginaryTimeEvolver, RealTimeEvolver};
pub use ode::OdeSolver;
pub use principle::{ImaginaryMcLachlan, RealMcLachlan, VariationalPrinciple};
pub use problem::TimeEvolutionProblem;
pub use result::TimeEvolutionResult;
pub use solver::{LinearSolver, Solution};
pub use var_qite::VarQite;
pub use var_qrte::VarQrte;
pub use var_qte::{EvolverConfig, VarQte};
