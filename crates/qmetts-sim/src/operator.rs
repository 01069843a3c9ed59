//! Weighted sums of Pauli strings.
//!
//! A [`PauliOperator`] is a Hermitian operator
//!
//!   O = Σ_k  c_k · P_k,   c_k ∈ ℝ
//!
//! on a fixed number of qubits. Hamiltonians and observables both use it.
//!
//! # Example
//!
//! ```rust
//! use qmetts_sim::operator::PauliOperator;
//!
//! // H = -ZI - IZ - 0.5 XX
//! let h = PauliOperator::from_list(&[("ZI", -1.0), ("IZ", -1.0), ("XX", -0.5)]).unwrap();
//! assert_eq!(h.num_qubits(), 2);
//! assert_eq!(h.n_terms(), 3);
//! ```

use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SimError, SimResult};
use crate::pauli::{PauliString, basis_phase};
use crate::statevector::{Statevector, inner_product};

/// A single weighted Pauli term: `coeff · pauli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// Real coefficient.
    pub coeff: f64,
    /// The Pauli string.
    pub pauli: PauliString,
}

impl PauliTerm {
    /// Create a new term.
    pub fn new(coeff: f64, pauli: PauliString) -> Self {
        Self { coeff, pauli }
    }
}

/// A real-weighted sum of Pauli strings on `num_qubits` qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliOperator {
    num_qubits: u32,
    terms: Vec<PauliTerm>,
}

impl PauliOperator {
    /// Create from terms, checking that every term fits the register.
    pub fn from_terms(num_qubits: u32, terms: Vec<PauliTerm>) -> SimResult<Self> {
        for term in &terms {
            if let Some(q) = term.pauli.max_qubit() {
                if q >= num_qubits {
                    return Err(SimError::QubitOutOfRange {
                        qubit: q,
                        n_qubits: num_qubits,
                    });
                }
            }
        }
        Ok(Self { num_qubits, terms })
    }

    /// Build from `(dense label, coefficient)` pairs. All labels must share a width.
    pub fn from_list<S: AsRef<str>>(list: &[(S, f64)]) -> SimResult<Self> {
        let Some((first, _)) = list.first() else {
            return Err(SimError::EmptyOperator);
        };
        let width = first.as_ref().chars().count();
        let mut terms = Vec::with_capacity(list.len());
        for (label, coeff) in list {
            let label = label.as_ref();
            let got = label.chars().count();
            if got != width {
                return Err(SimError::InvalidLabel {
                    label: label.to_string(),
                    reason: format!("expected {width} characters, got {got}"),
                });
            }
            terms.push(PauliTerm::new(*coeff, PauliString::from_label(label)?));
        }
        Self::from_terms(width as u32, terms)
    }

    /// The identity on `num_qubits` qubits.
    pub fn identity(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            terms: vec![PauliTerm::new(1.0, PauliString::identity())],
        }
    }

    /// Register width.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// All terms.
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// True if there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Spectral norm upper bound: Σ |c_k|.
    pub fn lambda(&self) -> f64 {
        self.terms.iter().map(|t| t.coeff.abs()).sum()
    }

    /// Dense `(label, coeff)` pairs, qubit 0 rightmost.
    pub fn to_list(&self) -> Vec<(String, f64)> {
        self.terms
            .iter()
            .map(|t| (t.pauli.to_label(self.num_qubits), t.coeff))
            .collect()
    }

    /// Place this operator on qubits `offset..offset + n` of a `width`-qubit register.
    pub fn embed(&self, offset: u32, width: u32) -> SimResult<Self> {
        if offset + self.num_qubits > width {
            return Err(SimError::DimensionMismatch {
                expected: width as usize,
                got: (offset + self.num_qubits) as usize,
            });
        }
        let terms = self
            .terms
            .iter()
            .map(|t| PauliTerm::new(t.coeff, t.pauli.shifted(offset)))
            .collect();
        Ok(Self {
            num_qubits: width,
            terms,
        })
    }

    fn check_state(&self, state: &Statevector) -> SimResult<()> {
        if state.num_qubits() == self.num_qubits() {
            Ok(())
        } else {
            Err(SimError::DimensionMismatch {
                expected: self.num_qubits(),
                got: state.num_qubits(),
            })
        }
    }

    /// `O|ψ⟩` as raw amplitudes (not normalized).
    pub fn apply(&self, state: &Statevector) -> SimResult<Vec<Complex64>> {
        self.check_state(state)?;
        let amps = state.amplitudes();
        let mut out = vec![Complex64::new(0.0, 0.0); amps.len()];
        for term in &self.terms {
            let (flip, phase, n_y) = term.pauli.masks();
            for (i, amp) in amps.iter().enumerate() {
                out[i ^ flip] += term.coeff * basis_phase(i, phase, n_y) * amp;
            }
        }
        Ok(out)
    }

    /// `⟨ψ|O|ψ⟩`. Real for a Hermitian operator; the imaginary part is dropped.
    pub fn expectation(&self, state: &Statevector) -> SimResult<f64> {
        let applied = self.apply(state)?;
        Ok(inner_product(state.amplitudes(), &applied).re)
    }

    /// Dense matrix in the computational basis.
    pub fn to_matrix(&self) -> DMatrix<Complex64> {
        let dim = 1usize << self.num_qubits;
        let mut m = DMatrix::from_element(dim, dim, Complex64::new(0.0, 0.0));
        for term in &self.terms {
            let (flip, phase, n_y) = term.pauli.masks();
            for col in 0..dim {
                m[(col ^ flip, col)] += term.coeff * basis_phase(col, phase, n_y);
            }
        }
        m
    }
}

impl fmt::Display for PauliOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, term) in self.terms.iter().enumerate() {
            let label = term.pauli.to_label(self.num_qubits);
            if i == 0 {
                write!(f, "{} * {label}", term.coeff)?;
            } else if term.coeff < 0.0 {
                write!(f, " - {} * {label}", -term.coeff)?;
            } else {
                write!(f, " + {} * {label}", term.coeff)?;
            }
        }
        Ok(())
    }
}
