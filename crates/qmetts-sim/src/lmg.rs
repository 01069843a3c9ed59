//! Lipkin–Meshkov–Glick spin model.
//!
//! All-to-all coupled spin-1/2 chain in a transverse field:
//!
//!   H = -B Σ_i Z_i  -  (1/N) Σ_{i<j} X_i X_j  -  (γ_y/N) Σ_{i<j} Y_i Y_j
//!
//! Terms are emitted in the order fields, XX couplings, YY couplings; zero
//! field or zero γ_y drops the corresponding block.

use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::exact::Spectrum;
use crate::operator::{PauliOperator, PauliTerm};
use crate::pauli::{PauliOp, PauliString};

/// Parameters of an LMG Hamiltonian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmgModel {
    /// Number of spins.
    pub n: u32,
    /// Anisotropy of the YY coupling.
    pub gy: f64,
    /// Transverse field strength.
    pub b: f64,
}

impl LmgModel {
    /// Create a model; at least one spin is required.
    pub fn new(n: u32, gy: f64, b: f64) -> SimResult<Self> {
        if n == 0 {
            return Err(SimError::EmptyOperator);
        }
        Ok(Self { n, gy, b })
    }

    /// Dense `(label, coeff)` pairs.
    ///
    /// Label position `i` (from the left) marks spin `i`; parsing turns it
    /// into qubit `N - 1 - i`, which leaves the permutation-symmetric
    /// Hamiltonian unchanged.
    pub fn pauli_labels(&self) -> Vec<(String, f64)> {
        let n = self.n as usize;
        let single = |i: usize, op: char| {
            let mut label = vec!['I'; n];
            label[i] = op;
            label
        };
        let pair = |i: usize, j: usize, op: char| {
            let mut label = single(i, op);
            label[j] = op;
            label.into_iter().collect::<String>()
        };

        let mut fields = Vec::new();
        let mut xx = Vec::new();
        let mut yy = Vec::new();
        for i in 0..n {
            if self.b != 0.0 {
                fields.push(single(i, 'Z').into_iter().collect::<String>());
            }
            for j in (i + 1)..n {
                xx.push(pair(i, j, 'X'));
                if self.gy != 0.0 {
                    yy.push(pair(i, j, 'Y'));
                }
            }
        }

        let inv_n = 1.0 / f64::from(self.n);
        fields
            .into_iter()
            .map(|l| (l, -self.b))
            .chain(xx.into_iter().map(|l| (l, -inv_n)))
            .chain(yy.into_iter().map(|l| (l, -self.gy * inv_n)))
            .collect()
    }

    /// The Hamiltonian as a Pauli operator.
    pub fn hamiltonian(&self) -> SimResult<PauliOperator> {
        let labels = self.pauli_labels();
        if labels.is_empty() {
            return Err(SimError::EmptyOperator);
        }
        PauliOperator::from_list(&labels)
    }

    /// Dense Hamiltonian matrix.
    pub fn matrix(&self) -> SimResult<DMatrix<Complex64>> {
        Ok(self.hamiltonian()?.to_matrix())
    }

    /// Exact eigen-decomposition of the Hamiltonian.
    pub fn spectrum(&self) -> SimResult<Spectrum> {
        Spectrum::of(&self.hamiltonian()?)
    }

    /// Mean magnetisation `(1/N) Σ_i P_i` along `axis`.
    pub fn magnetization(&self, axis: PauliOp) -> SimResult<PauliOperator> {
        if axis == PauliOp::I {
            return Ok(PauliOperator::identity(self.n));
        }
        let inv_n = 1.0 / f64::from(self.n);
        let terms = (0..self.n)
            .map(|q| PauliTerm::new(inv_n, PauliString::from_ops([(q, axis)])))
            .collect();
        PauliOperator::from_terms(self.n, terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_counts() {
        let model = LmgModel::new(4, 0.5, 1.0).unwrap();
        let labels = model.pauli_labels();
        // 4 fields + 6 XX + 6 YY
        assert_eq!(labels.len(), 16);
        assert_eq!(labels[0], ("ZIII".to_string(), -1.0));
        assert_eq!(labels[4], ("XXII".to_string(), -0.25));
        assert_eq!(labels[10], ("YYII".to_string(), -0.125));
    }

    #[test]
    fn test_zero_field_and_gy_drop_blocks() {
        let model = LmgModel::new(3, 0.0, 0.0).unwrap();
        let labels = model.pauli_labels();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().all(|(l, _)| !l.contains('Z') && !l.contains('Y')));
    }

    #[test]
    fn test_single_spin_without_field_is_empty() {
        let model = LmgModel::new(1, 0.0, 0.0).unwrap();
        assert!(matches!(model.hamiltonian(), Err(SimError::EmptyOperator)));
        assert!(LmgModel::new(0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_magnetization_on_all_up() {
        let model = LmgModel::new(3, 0.0, 1.0).unwrap();
        let mz = model.magnetization(PauliOp::Z).unwrap();
        let state = crate::statevector::Statevector::new(3);
        assert!((mz.expectation(&state).unwrap() - 1.0).abs() < 1e-12);
    }
}
