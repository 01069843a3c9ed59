//! Thermal-state algorithms on top of variational time evolution.
//!
//! - [`QmettsInstance`] samples Gibbs averages with minimally entangled
//!   typical thermal states: product states are evolved in imaginary time
//!   with [`qmetts_evolve::VarQite`] and collapsed by random product
//!   measurements into a Markov chain.
//! - [`Mhets`] minimises the Helmholtz free energy of a purified ansatz
//!   directly.
//! - [`Cobyla`] and [`Spsa`] are the derivative-free optimizers MHETS uses.
//!
//! # Example
//!
//! ```rust
//! use qmetts_evolve::{EvolverConfig, TwoLocal, TwoLocalConfig, VarQite};
//! use qmetts_sim::LmgModel;
//! use qmetts_thermal::{QmettsConfig, QmettsInstance};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let model = LmgModel::new(2, 0.0, 0.5).unwrap();
//! let h = model.hamiltonian().unwrap();
//! let ansatz = TwoLocal::new(2, TwoLocalConfig::default()).unwrap();
//! let qite = VarQite::new(Box::new(ansatz)).with_config(EvolverConfig::default());
//!
//! let config = QmettsConfig::default().with_beta_grid(0.1, 2).with_shots(5);
//! let qmetts = QmettsInstance::new(h.clone(), qite, config).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let results = qmetts.run(&h, &mut rng).unwrap();
//! assert_eq!(results.chains.len(), 2);
//! assert_eq!(results.chains[0].state_list.len(), 6);
//! ```

pub mod error;
pub mod mhets;
pub mod optimizer;
pub mod qmetts;
pub mod result;

pub use error::{ThermalError, ThermalResult};
pub use mhets::{Mhets, MhetsConfig, MhetsPoint, MhetsRun, MultiStart, refine_betas};
pub use optimizer::{AnyOptimizer, Cobyla, OptimizationResult, Optimizer, OptimizerKind, Spsa};
pub use qmetts::{MIN_BETA, Preparation, QmettsChain, QmettsConfig, QmettsInstance, linspace};
pub use result::QmettsResults;
