//! Exact diagonalization and Gibbs-state reference values.
//!
//! Everything here is dense linear algebra on the full 2^n Hilbert space and
//! is meant for the small systems the variational methods are checked
//! against.

use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;
use std::time::Instant;
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::operator::PauliOperator;
use crate::statevector::Statevector;

/// Sorted eigen-decomposition of a Hermitian matrix.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Eigenvalues, ascending.
    eigenvalues: Vec<f64>,
    /// Column `k` is the eigenvector of `eigenvalues[k]`.
    eigenvectors: DMatrix<Complex64>,
}

impl Spectrum {
    /// Diagonalize a Hermitian matrix. Only the lower triangle is read.
    pub fn from_matrix(matrix: DMatrix<Complex64>) -> SimResult<Self> {
        let (rows, cols) = matrix.shape();
        if rows != cols {
            return Err(SimError::NonSquareMatrix { rows, cols });
        }

        let start = Instant::now();
        let eigen = SymmetricEigen::new(matrix);

        let mut order: Vec<usize> = (0..rows).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

        let eigenvalues = order.iter().map(|&k| eigen.eigenvalues[k]).collect();
        let eigenvectors = DMatrix::from_fn(rows, rows, |r, c| eigen.eigenvectors[(r, order[c])]);

        debug!(
            dim = rows,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Diagonalized Hermitian matrix"
        );

        Ok(Self {
            eigenvalues,
            eigenvectors,
        })
    }

    /// Diagonalize a Pauli operator.
    pub fn of(op: &PauliOperator) -> SimResult<Self> {
        if op.is_empty() {
            return Err(SimError::EmptyOperator);
        }
        Self::from_matrix(op.to_matrix())
    }

    /// Eigenvalues, ascending.
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Hilbert-space dimension.
    pub fn dimension(&self) -> usize {
        self.eigenvalues.len()
    }

    /// The `k`-th eigenvector as a state.
    pub fn eigenvector(&self, k: usize) -> Option<Statevector> {
        if k >= self.dimension() {
            return None;
        }
        Statevector::from_amplitudes(self.eigenvectors.column(k).iter().copied().collect()).ok()
    }

    /// Lowest eigenvalue.
    pub fn ground_energy(&self) -> f64 {
        self.eigenvalues.first().copied().unwrap_or(0.0)
    }

    /// Lowest eigenvalue and its eigenvector.
    pub fn ground_state(&self) -> SimResult<(f64, Statevector)> {
        let state = self.eigenvector(0).ok_or(SimError::EmptyOperator)?;
        Ok((self.ground_energy(), state))
    }

    /// `Z = Σ_k e^{-β E_k}`.
    pub fn partition_function(&self, beta: f64) -> SimResult<f64> {
        check_beta(beta)?;
        Ok(self.eigenvalues.iter().map(|e| (-beta * e).exp()).sum())
    }

    /// Normalized Boltzmann weights `e^{-β E_k} / Z`.
    ///
    /// Energies are shifted by the ground energy before exponentiating, so
    /// large β does not underflow.
    pub fn boltzmann_weights(&self, beta: f64) -> SimResult<Vec<f64>> {
        check_beta(beta)?;
        let e0 = self.ground_energy();
        let raw: Vec<f64> = self
            .eigenvalues
            .iter()
            .map(|e| (-beta * (e - e0)).exp())
            .collect();
        let z: f64 = raw.iter().sum();
        Ok(raw.into_iter().map(|w| w / z).collect())
    }

    /// Gibbs state `ρ = Σ_k p_k |v_k⟩⟨v_k|`.
    pub fn thermal_state(&self, beta: f64) -> SimResult<DMatrix<Complex64>> {
        let weights = self.boltzmann_weights(beta)?;
        let dim = self.dimension();
        let mut rho = DMatrix::from_element(dim, dim, Complex64::new(0.0, 0.0));
        for (k, p) in weights.iter().enumerate() {
            if *p == 0.0 {
                continue;
            }
            let v = self.eigenvectors.column(k);
            for a in 0..dim {
                for b in 0..dim {
                    rho[(a, b)] += *p * v[a] * v[b].conj();
                }
            }
        }
        Ok(rho)
    }

    /// Thermal energy `⟨H⟩_β`.
    pub fn thermal_energy(&self, beta: f64) -> SimResult<f64> {
        let weights = self.boltzmann_weights(beta)?;
        Ok(weights.iter().zip(&self.eigenvalues).map(|(p, e)| p * e).sum())
    }

    /// Von Neumann entropy of the Gibbs state.
    pub fn entropy(&self, beta: f64) -> SimResult<f64> {
        Ok(shannon_entropy(&self.boltzmann_weights(beta)?))
    }

    /// `β⟨H⟩_β - S(ρ_β)`, the quantity MHETS minimises. Equals `-ln Z`.
    pub fn helmholtz_cost(&self, beta: f64) -> SimResult<f64> {
        Ok(beta * self.thermal_energy(beta)? - self.entropy(beta)?)
    }

    /// `Tr(O ρ_β)` for a dense observable.
    pub fn thermal_average(&self, observable: &DMatrix<Complex64>, beta: f64) -> SimResult<f64> {
        let rho = self.thermal_state(beta)?;
        Ok(trace_product(observable, &rho)?.re)
    }
}

fn check_beta(beta: f64) -> SimResult<()> {
    if beta.is_finite() && beta >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidBeta(beta))
    }
}

/// `Tr(A B)` without forming the product.
pub fn trace_product(a: &DMatrix<Complex64>, b: &DMatrix<Complex64>) -> SimResult<Complex64> {
    if a.ncols() != b.nrows() || a.nrows() != b.ncols() {
        return Err(SimError::DimensionMismatch {
            expected: a.nrows(),
            got: b.ncols(),
        });
    }
    let mut tr = Complex64::new(0.0, 0.0);
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            tr += a[(i, j)] * b[(j, i)];
        }
    }
    Ok(tr)
}

/// `-Σ p ln p`, skipping zero entries.
pub fn shannon_entropy(probabilities: &[f64]) -> f64 {
    probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Von Neumann entropy `-Tr(ρ ln ρ)` of a density matrix.
pub fn von_neumann_entropy(rho: &DMatrix<Complex64>) -> SimResult<f64> {
    let spectrum = Spectrum::from_matrix(rho.clone())?;
    // Tiny negative eigenvalues are rounding noise.
    let p: Vec<f64> = spectrum.eigenvalues().iter().map(|&v| v.max(0.0)).collect();
    Ok(shannon_entropy(&p))
}

/// Relative entropy of the computational-basis populations,
/// `Σ_i p_i (ln p_i - ln q_i)` with `p = diag(first)`, `q = diag(second)`.
///
/// Entries where either population vanishes are skipped.
pub fn relative_entropy(first: &DMatrix<Complex64>, second: &DMatrix<Complex64>) -> SimResult<f64> {
    if first.shape() != second.shape() {
        return Err(SimError::DimensionMismatch {
            expected: first.nrows(),
            got: second.nrows(),
        });
    }
    let mut s = 0.0;
    for i in 0..first.nrows().min(first.ncols()) {
        let p = first[(i, i)].re;
        let q = second[(i, i)].re;
        if p > 0.0 && q > 0.0 {
            s += p * (p.ln() - q.ln());
        }
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_x() -> PauliOperator {
        PauliOperator::from_list(&[("X", -1.0)]).unwrap()
    }

    #[test]
    fn test_sorted_eigenvalues() {
        let op = PauliOperator::from_list(&[("ZI", 1.0), ("IZ", 0.5)]).unwrap();
        let spectrum = Spectrum::of(&op).unwrap();
        let expected = [-1.5, -0.5, 0.5, 1.5];
        for (got, want) in spectrum.eigenvalues().iter().zip(expected) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    #[test]
    fn test_ground_state_of_field() {
        let spectrum = Spectrum::of(&field_x()).unwrap();
        let (e0, state) = spectrum.ground_state().unwrap();
        assert!((e0 + 1.0).abs() < 1e-10);
        let plus = Statevector::from_label("+").unwrap();
        assert!((state.fidelity(&plus).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_partition_function_two_level() {
        let spectrum = Spectrum::of(&field_x()).unwrap();
        let beta = 0.7;
        let z = spectrum.partition_function(beta).unwrap();
        assert!((z - 2.0 * beta.cosh()).abs() < 1e-10);
        assert!((spectrum.helmholtz_cost(beta).unwrap() + z.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_thermal_state_has_unit_trace() {
        let op = PauliOperator::from_list(&[("XX", -1.0), ("ZI", 0.3)]).unwrap();
        let rho = Spectrum::of(&op).unwrap().thermal_state(1.3).unwrap();
        assert!((rho.trace().re - 1.0).abs() < 1e-10);
        assert!(rho.trace().im.abs() < 1e-10);
    }

    #[test]
    fn test_infinite_temperature_average() {
        let h = PauliOperator::from_list(&[("XX", -1.0), ("ZI", 0.3)]).unwrap();
        let obs = PauliOperator::from_list(&[("ZZ", 1.0), ("II", 0.25)])
            .unwrap()
            .to_matrix();
        let avg = Spectrum::of(&h).unwrap().thermal_average(&obs, 0.0).unwrap();
        assert!((avg - 0.25).abs() < 1e-10);
    }

    #[test]
    fn test_invalid_beta() {
        let spectrum = Spectrum::of(&field_x()).unwrap();
        assert!(matches!(
            spectrum.partition_function(-1.0),
            Err(SimError::InvalidBeta(_))
        ));
        assert!(spectrum.thermal_state(f64::NAN).is_err());
    }

    #[test]
    fn test_relative_entropy_of_identical_states_is_zero() {
        let rho = Spectrum::of(&field_x()).unwrap().thermal_state(0.4).unwrap();
        assert!(relative_entropy(&rho, &rho).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_von_neumann_entropy_of_maximally_mixed() {
        let rho = DMatrix::from_diagonal_element(4, 4, Complex64::new(0.25, 0.0));
        assert!((von_neumann_entropy(&rho).unwrap() - 4f64.ln()).abs() < 1e-10);
    }
}
