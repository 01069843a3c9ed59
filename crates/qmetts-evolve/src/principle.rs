//! McLachlan variational principles.
//!
//! Both principles share the metric
//!
//!   A_kl = Re(⟨∂_kψ|∂_lψ⟩ − ⟨∂_kψ|ψ⟩⟨ψ|∂_lψ⟩)
//!
//! and differ in how the projected energy overlap
//!
//!   z_k = ⟨∂_kψ|H|ψ⟩ − ⟨∂_kψ|ψ⟩ E
//!
//! enters the right-hand side of `A θ̇ = C`.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use std::fmt;

use qmetts_sim::PauliOperator;
use qmetts_sim::statevector::inner_product;

use crate::error::EvolveResult;
use crate::gradient::TangentStates;

/// Maps the projected overlap `z_k` to the right-hand side `C_k`.
pub trait VariationalPrinciple: fmt::Debug + Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// `C_k` from `z_k`.
    fn gradient_component(&self, overlap: Complex64) -> f64;
}

/// Imaginary time: `dψ/dτ = -(H - E)ψ`, so `C_k = -Re z_k`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImaginaryMcLachlan;

impl VariationalPrinciple for ImaginaryMcLachlan {
    fn name(&self) -> &'static str {
        "imaginary_mclachlan"
    }

    fn gradient_component(&self, overlap: Complex64) -> f64 {
        -overlap.re
    }
}

/// Real time: `dψ/dt = -iHψ`, so `C_k = Im z_k`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealMcLachlan;

impl VariationalPrinciple for RealMcLachlan {
    fn name(&self) -> &'static str {
        "real_mclachlan"
    }

    fn gradient_component(&self, overlap: Complex64) -> f64 {
        overlap.im
    }
}

/// The McLachlan metric `A`.
pub fn metric_tensor(tangent: &TangentStates) -> DMatrix<f64> {
    let psi = tangent.state.amplitudes();
    let d = &tangent.derivatives;
    let berry: Vec<Complex64> = d
        .iter()
        .map(|dk| inner_product(dk.amplitudes(), psi))
        .collect();

    let p = d.len();
    let mut metric = DMatrix::zeros(p, p);
    for k in 0..p {
        for l in k..p {
            let value = (inner_product(d[k].amplitudes(), d[l].amplitudes())
                - berry[k] * berry[l].conj())
            .re;
            metric[(k, l)] = value;
            metric[(l, k)] = value;
        }
    }
    metric
}

/// Energy `E = ⟨ψ|H|ψ⟩` and the projected overlaps `z_k`.
pub fn energy_overlaps(
    hamiltonian: &PauliOperator,
    tangent: &TangentStates,
) -> EvolveResult<(f64, Vec<Complex64>)> {
    let psi = tangent.state.amplitudes();
    let h_psi = hamiltonian.apply(&tangent.state)?;
    let energy = inner_product(psi, &h_psi).re;
    let overlaps = tangent
        .derivatives
        .iter()
        .map(|dk| inner_product(dk.amplitudes(), &h_psi) - inner_product(dk.amplitudes(), psi) * energy)
        .collect();
    Ok((energy, overlaps))
}

/// Energy and right-hand side `C` under `principle`.
pub fn evolution_gradient<P: VariationalPrinciple + ?Sized>(
    principle: &P,
    hamiltonian: &PauliOperator,
    tangent: &TangentStates,
) -> EvolveResult<(f64, DVector<f64>)> {
    let (energy, overlaps) = energy_overlaps(hamiltonian, tangent)?;
    let rhs = DVector::from_iterator(
        overlaps.len(),
        overlaps.into_iter().map(|z| principle.gradient_component(z)),
    );
    Ok((energy, rhs))
}
