//! Parameterised trial circuits.
//!
//! Two families are provided:
//!
//! - [`TwoLocal`]: alternating single-qubit rotation layers and two-qubit
//!   entangling layers, closed by a final rotation layer.
//! - [`PhysicallyMotivated`]: parity-preserving `RXY`/`RYX` pairs, suited to
//!   the LMG model whose Hamiltonian commutes with the Z-parity.
//!
//! Parameters are named `<par_name>_<i>` and the circuit is built once, in
//! symbolic form. Parameter vectors live with whoever evolves or optimises
//! the ansatz.

use serde::{Deserialize, Serialize};
use std::fmt;

use qmetts_ir::{Circuit, ParameterExpression, ParameterValues, QubitId, StandardGate, bind_values};
use qmetts_sim::{SimError, StateLabel, Statevector};

use crate::error::{EvolveError, EvolveResult};

/// A parameterised trial state `|ψ(θ)⟩ = U(θ)|0…0⟩`.
pub trait Ansatz: fmt::Debug + Send + Sync {
    /// Short family name.
    fn name(&self) -> &'static str;

    /// Register width.
    fn num_qubits(&self) -> usize;

    /// Prefix of every parameter name.
    fn par_name(&self) -> &str;

    /// The symbolic circuit.
    fn circuit(&self) -> &Circuit;

    /// Parameter names in vector order.
    fn parameter_names(&self) -> &[String];

    /// Length of a parameter vector.
    fn num_parameters(&self) -> usize {
        self.parameter_names().len()
    }

    /// Parameter vector preparing the product state `label`.
    fn product_state_parameters(&self, label: &StateLabel) -> EvolveResult<Vec<f64>>;

    /// Map a parameter vector to symbol values.
    fn bind(&self, values: &[f64]) -> EvolveResult<ParameterValues> {
        check_parameter_count(self.num_parameters(), values.len())?;
        Ok(bind_values(self.parameter_names(), values))
    }

    /// `|ψ(θ)⟩`.
    fn state(&self, values: &[f64]) -> EvolveResult<Statevector> {
        let bound = self.bind(values)?;
        let mut state = Statevector::new(self.num_qubits());
        state.evolve(self.circuit(), &bound)?;
        Ok(state)
    }
}

pub(crate) fn check_parameter_count(expected: usize, got: usize) -> EvolveResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(EvolveError::ParameterCountMismatch { expected, got })
    }
}

fn check_label_width(label: &StateLabel, num_qubits: usize) -> EvolveResult<()> {
    if label.num_qubits() == num_qubits {
        Ok(())
    } else {
        Err(SimError::DimensionMismatch {
            expected: num_qubits,
            got: label.num_qubits(),
        }
        .into())
    }
}

fn parameter_names(par_name: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{par_name}_{i}")).collect()
}

// =============================================================================
// Layout options
// =============================================================================

/// Single-qubit rotation used in a [`TwoLocal`] rotation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationBlock {
    /// `Rx(θ)`.
    Rx,
    /// `Ry(θ)`.
    Ry,
    /// `Rz(θ)`.
    Rz,
}

impl RotationBlock {
    fn gate(self, theta: ParameterExpression) -> StandardGate {
        match self {
            RotationBlock::Rx => StandardGate::Rx(theta),
            RotationBlock::Ry => StandardGate::Ry(theta),
            RotationBlock::Rz => StandardGate::Rz(theta),
        }
    }
}

/// Two-qubit gate used in a [`TwoLocal`] entanglement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntanglementBlock {
    /// Controlled-X.
    Cx,
    /// Controlled-Z.
    Cz,
}

impl EntanglementBlock {
    fn gate(self) -> StandardGate {
        match self {
            EntanglementBlock::Cx => StandardGate::CX,
            EntanglementBlock::Cz => StandardGate::CZ,
        }
    }
}

/// Which qubit pairs an entangling layer couples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entanglement {
    /// Nearest neighbours `(i, i+1)`.
    #[default]
    Linear,
    /// Every pair `(i, j)` with `i < j`.
    #[serde(alias = "all")]
    Full,
}

impl Entanglement {
    /// Qubit pairs in layer order.
    pub fn pairs(self, num_qubits: usize) -> Vec<(usize, usize)> {
        match self {
            Entanglement::Linear => (0..num_qubits.saturating_sub(1)).map(|i| (i, i + 1)).collect(),
            Entanglement::Full => (0..num_qubits)
                .flat_map(|i| ((i + 1)..num_qubits).map(move |j| (i, j)))
                .collect(),
        }
    }
}

// =============================================================================
// TwoLocal
// =============================================================================

fn default_rotation_blocks() -> Vec<RotationBlock> {
    vec![RotationBlock::Ry]
}

fn default_entanglement_blocks() -> Vec<EntanglementBlock> {
    vec![EntanglementBlock::Cx]
}

fn default_reps() -> usize {
    1
}

fn default_par_name() -> String {
    "x".to_string()
}

/// Layout of a [`TwoLocal`] ansatz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoLocalConfig {
    /// Rotations applied to every qubit in each rotation layer.
    #[serde(default = "default_rotation_blocks")]
    pub rotation_blocks: Vec<RotationBlock>,
    /// Gates applied to every coupled pair in each entanglement layer.
    #[serde(default = "default_entanglement_blocks")]
    pub entanglement_blocks: Vec<EntanglementBlock>,
    /// Coupled pairs.
    #[serde(default)]
    pub entanglement: Entanglement,
    /// Number of rotation + entanglement repetitions.
    #[serde(default = "default_reps")]
    pub reps: usize,
    /// Parameter name prefix.
    #[serde(default = "default_par_name")]
    pub par_name: String,
}

impl Default for TwoLocalConfig {
    fn default() -> Self {
        Self {
            rotation_blocks: default_rotation_blocks(),
            entanglement_blocks: default_entanglement_blocks(),
            entanglement: Entanglement::default(),
            reps: default_reps(),
            par_name: default_par_name(),
        }
    }
}

/// Rotation layers interleaved with entangling layers.
///
/// For `reps = r` the circuit is `r` times (rotation layer, entanglement
/// layer) followed by one final rotation layer, so there are
/// `n · |rotation_blocks| · (r + 1)` parameters. Within a rotation layer,
/// parameter `layer · n · B + q · B + b` drives block `b` on qubit `q`.
#[derive(Debug, Clone)]
pub struct TwoLocal {
    num_qubits: usize,
    config: TwoLocalConfig,
    names: Vec<String>,
    circuit: Circuit,
}

impl TwoLocal {
    /// Build the ansatz.
    pub fn new(num_qubits: usize, config: TwoLocalConfig) -> EvolveResult<Self> {
        if num_qubits == 0 {
            return Err(EvolveError::InvalidAnsatz("at least one qubit is required".into()));
        }
        if config.rotation_blocks.is_empty() {
            return Err(EvolveError::InvalidAnsatz(
                "two_local needs at least one rotation block".into(),
            ));
        }

        let blocks = config.rotation_blocks.len();
        let names = parameter_names(&config.par_name, num_qubits * blocks * (config.reps + 1));
        let mut circuit = Circuit::with_size("two_local", num_qubits as u32);

        let rotation_layer = |circuit: &mut Circuit, layer: usize| -> EvolveResult<()> {
            let offset = layer * num_qubits * blocks;
            for q in 0..num_qubits {
                for (b, block) in config.rotation_blocks.iter().enumerate() {
                    let theta = ParameterExpression::symbol(names[offset + q * blocks + b].as_str());
                    circuit.gate(block.gate(theta), [QubitId::from(q)])?;
                }
            }
            Ok(())
        };

        for rep in 0..config.reps {
            rotation_layer(&mut circuit, rep)?;
            for (a, b) in config.entanglement.pairs(num_qubits) {
                for block in &config.entanglement_blocks {
                    circuit.gate(block.gate(), [QubitId::from(a), QubitId::from(b)])?;
                }
            }
        }
        rotation_layer(&mut circuit, config.reps)?;

        Ok(Self {
            num_qubits,
            config,
            names,
            circuit,
        })
    }

    /// Layout options.
    pub fn config(&self) -> &TwoLocalConfig {
        &self.config
    }

    /// Number of repetitions.
    pub fn reps(&self) -> usize {
        self.config.reps
    }
}

impl Ansatz for TwoLocal {
    fn name(&self) -> &'static str {
        "two_local"
    }

    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn par_name(&self) -> &str {
        &self.config.par_name
    }

    fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    fn parameter_names(&self) -> &[String] {
        &self.names
    }

    /// Earlier layers are zero, so the entanglers act on `|0…0⟩` and the
    /// final-layer `ry` angles alone set the state.
    fn product_state_parameters(&self, label: &StateLabel) -> EvolveResult<Vec<f64>> {
        check_label_width(label, self.num_qubits)?;
        let Some(ry) = self
            .config
            .rotation_blocks
            .iter()
            .position(|b| *b == RotationBlock::Ry)
        else {
            return Err(EvolveError::UnsupportedProductState {
                ansatz: self.name().to_string(),
                label: label.to_string(),
            });
        };

        let blocks = self.config.rotation_blocks.len();
        let offset = self.config.reps * self.num_qubits * blocks;
        let mut params = vec![0.0; self.num_parameters()];
        for (q, angle) in label.ry_angles().into_iter().enumerate() {
            params[offset + q * blocks + ry] = angle;
        }
        Ok(params)
    }
}

// =============================================================================
// Physically motivated ansatz
// =============================================================================

/// Layout of a [`PhysicallyMotivated`] ansatz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmaConfig {
    /// Coupled pairs.
    #[serde(default)]
    pub entanglement: Entanglement,
    /// Number of layers minus one.
    #[serde(default = "default_reps")]
    pub reps: usize,
    /// Parameter name prefix.
    #[serde(default = "default_par_name")]
    pub par_name: String,
}

impl Default for PmaConfig {
    fn default() -> Self {
        Self {
            entanglement: Entanglement::default(),
            reps: default_reps(),
            par_name: default_par_name(),
        }
    }
}

/// Parity-preserving ansatz built from `RXY(θ)·RYX(θ')` blocks.
///
/// Each of the `reps + 1` layers applies `RXY` then `RYX` to every coupled
/// pair, each with its own parameter.
#[derive(Debug, Clone)]
pub struct PhysicallyMotivated {
    num_qubits: usize,
    config: PmaConfig,
    names: Vec<String>,
    circuit: Circuit,
}

impl PhysicallyMotivated {
    /// Build the ansatz. At least two qubits are required.
    pub fn new(num_qubits: usize, config: PmaConfig) -> EvolveResult<Self> {
        if num_qubits < 2 {
            return Err(EvolveError::InvalidAnsatz(
                "pma couples qubit pairs and needs at least two qubits".into(),
            ));
        }

        let pairs = config.entanglement.pairs(num_qubits);
        let names = parameter_names(&config.par_name, 2 * pairs.len() * (config.reps + 1));
        let mut circuit = Circuit::with_size("pma", num_qubits as u32);

        let mut counter = 0;
        for _ in 0..=config.reps {
            for &(a, b) in &pairs {
                let (qa, qb) = (QubitId::from(a), QubitId::from(b));
                circuit.rxy(names[counter].as_str(), qa, qb)?;
                circuit.ryx(names[counter + 1].as_str(), qa, qb)?;
                counter += 2;
            }
        }

        Ok(Self {
            num_qubits,
            config,
            names,
            circuit,
        })
    }

    /// Layout options.
    pub fn config(&self) -> &PmaConfig {
        &self.config
    }
}

impl Ansatz for PhysicallyMotivated {
    fn name(&self) -> &'static str {
        "pma"
    }

    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn par_name(&self) -> &str {
        &self.config.par_name
    }

    fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    fn parameter_names(&self) -> &[String] {
        &self.names
    }

    /// Only `|0…0⟩` is reachable with a known parameter vector.
    fn product_state_parameters(&self, label: &StateLabel) -> EvolveResult<Vec<f64>> {
        check_label_width(label, self.num_qubits)?;
        if label.as_str().chars().all(|c| c == '0') {
            Ok(vec![0.0; self.num_parameters()])
        } else {
            Err(EvolveError::UnsupportedProductState {
                ansatz: self.name().to_string(),
                label: label.to_string(),
            })
        }
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Ansatz family and layout, as read from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnsatzConfig {
    /// [`TwoLocal`].
    TwoLocal(TwoLocalConfig),
    /// [`PhysicallyMotivated`].
    Pma(PmaConfig),
}

impl Default for AnsatzConfig {
    fn default() -> Self {
        AnsatzConfig::TwoLocal(TwoLocalConfig::default())
    }
}

impl AnsatzConfig {
    /// Build the ansatz on `num_qubits` qubits.
    pub fn build(&self, num_qubits: usize) -> EvolveResult<Box<dyn Ansatz>> {
        Ok(match self {
            AnsatzConfig::TwoLocal(config) => Box::new(TwoLocal::new(num_qubits, config.clone())?),
            AnsatzConfig::Pma(config) => {
                Box::new(PhysicallyMotivated::new(num_qubits, config.clone())?)
            }
        })
    }

    /// Repetition count of either family.
    pub fn reps(&self) -> usize {
        match self {
            AnsatzConfig::TwoLocal(config) => config.reps,
            AnsatzConfig::Pma(config) => config.reps,
        }
    }
}
