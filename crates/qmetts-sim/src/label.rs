//! Product-state and product-measurement labels.
//!
//! A [`StateLabel`] names a product state over `0 1 + -` and a
//! [`MeasureLabel`] names a product measurement over `x z`. In both,
//! character `i` refers to qubit `i`. The helpers here generate the label
//! sets a QMETTS run works with and turn measurement outcomes back into
//! state labels.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use qmetts_ir::{Circuit, ParameterValues, QubitId};

use crate::error::{SimError, SimResult};
use crate::operator::PauliOperator;
use crate::statevector::Statevector;

/// Single-qubit measurement basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasisOp {
    /// Eigenbasis of X: `+` and `-`.
    X,
    /// Computational basis: `0` and `1`.
    Z,
}

impl BasisOp {
    /// Parse `x` or `z` (case-insensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'x' => Some(BasisOp::X),
            'z' => Some(BasisOp::Z),
            _ => None,
        }
    }

    /// Lower-case label character.
    pub fn as_char(self) -> char {
        match self {
            BasisOp::X => 'x',
            BasisOp::Z => 'z',
        }
    }

    /// The two eigenstates, indexed by the enumeration bit of a manual basis.
    pub fn eigenstates(self) -> [char; 2] {
        match self {
            BasisOp::X => ['-', '+'],
            BasisOp::Z => ['0', '1'],
        }
    }

    /// State a qubit collapses to when a Z-basis readout after the basis
    /// change returns `bit`.
    pub fn collapsed(self, bit: bool) -> char {
        match (self, bit) {
            (BasisOp::X, false) => '+',
            (BasisOp::X, true) => '-',
            (BasisOp::Z, false) => '0',
            (BasisOp::Z, true) => '1',
        }
    }
}

/// Validated product-state label over `0 1 + -`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateLabel(String);

impl StateLabel {
    /// Validate a label.
    pub fn new(label: impl Into<String>) -> SimResult<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(SimError::InvalidLabel {
                label,
                reason: "label is empty".into(),
            });
        }
        if let Some(c) = label.chars().find(|c| !matches!(c, '0' | '1' | '+' | '-')) {
            return Err(SimError::InvalidLabel {
                reason: format!("'{c}' is not one of 0, 1, +, -"),
                label,
            });
        }
        Ok(Self(label))
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.0.len()
    }

    /// Ry angle preparing each qubit's state from `|0⟩`.
    pub fn ry_angles(&self) -> Vec<f64> {
        self.0
            .chars()
            .map(|c| match c {
                '-' => -FRAC_PI_2,
                '+' => FRAC_PI_2,
                '1' => std::f64::consts::PI,
                _ => 0.0,
            })
            .collect()
    }

    /// The product state itself.
    pub fn statevector(&self) -> Statevector {
        // The alphabet was checked on construction.
        Statevector::from_label(&self.0).unwrap_or_else(|_| Statevector::new(self.num_qubits()))
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StateLabel {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StateLabel {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StateLabel> for String {
    fn from(label: StateLabel) -> Self {
        label.0
    }
}

/// Validated product-measurement label over `x z`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MeasureLabel(String);

impl MeasureLabel {
    /// Validate a label. Upper-case input is accepted and lower-cased.
    pub fn new(label: impl Into<String>) -> SimResult<Self> {
        let label = label.into().to_ascii_lowercase();
        if label.is_empty() {
            return Err(SimError::InvalidLabel {
                label,
                reason: "label is empty".into(),
            });
        }
        if let Some(c) = label.chars().find(|&c| BasisOp::from_char(c).is_none()) {
            return Err(SimError::InvalidLabel {
                reason: format!("'{c}' is not a measurement basis (x or z)"),
                label,
            });
        }
        Ok(Self(label))
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.0.len()
    }

    /// Per-qubit bases.
    pub fn bases(&self) -> Vec<BasisOp> {
        self.0.chars().filter_map(BasisOp::from_char).collect()
    }

    /// Every state label this measurement can collapse to, in enumeration
    /// order (first qubit most significant, `x` enumerates `-` before `+`).
    pub fn eigenstates(&self) -> Vec<StateLabel> {
        let bases = self.bases();
        cartesian(&bases.iter().map(|b| b.eigenstates().to_vec()).collect::<Vec<_>>())
            .into_iter()
            .map(StateLabel)
            .collect()
    }

    /// Basis change that maps this measurement onto the computational basis,
    /// followed by a full measurement.
    pub fn circuit(&self) -> SimResult<Circuit> {
        let mut circuit = Circuit::with_size(format!("measure_{}", self.0), self.num_qubits() as u32);
        for (q, basis) in self.bases().into_iter().enumerate() {
            if basis == BasisOp::X {
                circuit.h(QubitId::from(q))?;
            }
        }
        circuit.measure_all()?;
        Ok(circuit)
    }
}

impl fmt::Display for MeasureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MeasureLabel {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MeasureLabel {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MeasureLabel> for String {
    fn from(label: MeasureLabel) -> Self {
        label.0
    }
}

/// How the operator list passed to the label generators is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFlag {
    /// Every combination of the single-qubit bases given.
    #[default]
    AllPossible,
    /// One product measurement per basis, the same on every qubit.
    #[serde(alias = "every_qbit_same")]
    EveryQubitSame,
    /// The product measurements are listed verbatim.
    Manual,
}

impl FromStr for LabelFlag {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all_possible" => Ok(LabelFlag::AllPossible),
            "every_qbit_same" | "every_qubit_same" => Ok(LabelFlag::EveryQubitSame),
            "manual" => Ok(LabelFlag::Manual),
            other => Err(SimError::InvalidLabel {
                label: other.to_string(),
                reason: "flags allowed are all_possible, every_qubit_same or manual".into(),
            }),
        }
    }
}

fn single_bases(operators: &[String]) -> SimResult<Vec<BasisOp>> {
    operators
        .iter()
        .map(|op| {
            let mut chars = op.chars();
            match (chars.next().and_then(BasisOp::from_char), chars.next()) {
                (Some(b), None) => Ok(b),
                _ => Err(SimError::InvalidLabel {
                    label: op.clone(),
                    reason: "expected a single-qubit basis (x or z)".into(),
                }),
            }
        })
        .collect()
}

fn cartesian(choices: &[Vec<char>]) -> Vec<String> {
    choices.iter().fold(vec![String::new()], |acc, options| {
        acc.iter()
            .flat_map(|prefix| {
                options.iter().map(move |c| {
                    let mut s = prefix.clone();
                    s.push(*c);
                    s
                })
            })
            .collect()
    })
}

fn dedup_in_order<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// The product measurements a QMETTS chain chooses from.
pub fn generate_basis_measure_list(
    num_qubits: usize,
    operators: &[String],
    flag: LabelFlag,
) -> SimResult<Vec<MeasureLabel>> {
    let labels = match flag {
        LabelFlag::AllPossible => {
            let bases = single_bases(operators)?;
            let alphabet: Vec<char> = bases.iter().map(|b| b.as_char()).collect();
            cartesian(&vec![alphabet; num_qubits])
                .into_iter()
                .map(MeasureLabel)
                .collect()
        }
        LabelFlag::EveryQubitSame => single_bases(operators)?
            .into_iter()
            .map(|b| MeasureLabel(b.as_char().to_string().repeat(num_qubits)))
            .collect(),
        LabelFlag::Manual => operators
            .iter()
            .map(|op| {
                let label = MeasureLabel::new(op.as_str())?;
                if label.num_qubits() == num_qubits {
                    Ok(label)
                } else {
                    Err(SimError::DimensionMismatch {
                        expected: num_qubits,
                        got: label.num_qubits(),
                    })
                }
            })
            .collect::<SimResult<Vec<_>>>()?,
    };
    Ok(dedup_in_order(labels))
}

/// The product states those measurements can produce.
pub fn generate_basis_list(
    num_qubits: usize,
    operators: &[String],
    flag: LabelFlag,
) -> SimResult<Vec<StateLabel>> {
    let labels = match flag {
        LabelFlag::AllPossible => {
            let alphabet: Vec<char> = single_bases(operators)?
                .into_iter()
                .flat_map(BasisOp::eigenstates)
                .collect();
            cartesian(&vec![alphabet; num_qubits])
                .into_iter()
                .map(StateLabel)
                .collect()
        }
        LabelFlag::EveryQubitSame => single_bases(operators)?
            .into_iter()
            .flat_map(|b| cartesian(&vec![b.eigenstates().to_vec(); num_qubits]))
            .map(StateLabel)
            .collect(),
        LabelFlag::Manual => generate_basis_measure_list(num_qubits, operators, flag)?
            .iter()
            .flat_map(MeasureLabel::eigenstates)
            .collect(),
    };
    Ok(dedup_in_order(labels))
}

/// Pick one measurement uniformly at random.
pub fn random_measure_label<'a, R: Rng + ?Sized>(
    basis_measure_list: &'a [MeasureLabel],
    rng: &mut R,
) -> Option<&'a MeasureLabel> {
    basis_measure_list.choose(rng)
}

/// Turn a Z-basis readout (qubit 0 first) taken after `measure`'s basis
/// change into the state label it collapsed to.
pub fn z_to_x_state_label(outcome: &str, measure: &MeasureLabel) -> SimResult<StateLabel> {
    if outcome.chars().count() != measure.num_qubits() {
        return Err(SimError::DimensionMismatch {
            expected: measure.num_qubits(),
            got: outcome.chars().count(),
        });
    }
    let mut label = String::with_capacity(outcome.len());
    for (bit, basis) in outcome.chars().zip(measure.bases()) {
        let bit = match bit {
            '0' => false,
            '1' => true,
            other => {
                return Err(SimError::InvalidLabel {
                    label: outcome.to_string(),
                    reason: format!("'{other}' is not a readout bit"),
                });
            }
        };
        label.push(basis.collapsed(bit));
    }
    StateLabel::new(label)
}

/// Measure `state` once in a randomly chosen product basis.
///
/// Returns the measurement used and the label of the collapsed product state.
pub fn choose_state<R: Rng + ?Sized>(
    state: &Statevector,
    basis_measure_list: &[MeasureLabel],
    rng: &mut R,
) -> SimResult<(MeasureLabel, StateLabel)> {
    let measure = random_measure_label(basis_measure_list, rng)
        .ok_or_else(|| SimError::InvalidLabel {
            label: String::new(),
            reason: "no measurement bases to choose from".into(),
        })?
        .clone();
    let mut rotated = state.clone();
    rotated.evolve(&measure.circuit()?, &ParameterValues::default())?;
    let outcome = rotated.sample(rng)?;
    let collapsed = z_to_x_state_label(&rotated.outcome_to_bitstring(outcome), &measure)?;
    Ok((measure, collapsed))
}

/// `⟨ψ|O|ψ⟩`.
pub fn exp_value(state: &Statevector, observable: &PauliOperator) -> SimResult<f64> {
    observable.expectation(state)
}
