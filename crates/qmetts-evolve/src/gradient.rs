//! Exact tangent vectors of an ansatz state.
//!
//! Every parameterised gate in the supported circuits is a Pauli rotation
//! `R(φ) = exp(-iφ/2 · P)`, so `∂R/∂φ = -i/2 · P · R(φ)`. Running the circuit
//! once while carrying one derivative vector per parameter gives
//! `∂_k|ψ(θ)⟩` for all `k`; angle expressions contribute through the chain
//! rule `∂φ/∂θ_k`.

use num_complex::Complex64;
use std::collections::HashMap;

use qmetts_sim::{Statevector, rotation_generator};

use crate::ansatz::Ansatz;
use crate::error::EvolveResult;

/// `|ψ(θ)⟩` together with `∂_k|ψ(θ)⟩` for every parameter.
#[derive(Debug, Clone)]
pub struct TangentStates {
    /// The state itself.
    pub state: Statevector,
    /// Derivative vectors in parameter order. Not normalized.
    pub derivatives: Vec<Statevector>,
}

impl TangentStates {
    /// Number of parameters.
    pub fn num_parameters(&self) -> usize {
        self.derivatives.len()
    }
}

/// Simulate `ansatz` at `values` and differentiate with respect to every
/// parameter.
pub fn tangent_states(ansatz: &dyn Ansatz, values: &[f64]) -> EvolveResult<TangentStates> {
    let bound = ansatz.bind(values)?;
    let names = ansatz.parameter_names();
    let index: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(k, name)| (name.as_str(), k))
        .collect();

    let n = ansatz.num_qubits();
    let zero = Statevector::from_amplitudes(vec![Complex64::new(0.0, 0.0); 1 << n])?;
    let mut state = Statevector::new(n);
    let mut derivatives = vec![zero; names.len()];
    // Derivative vectors stay zero until their parameter's first gate.
    let mut active = vec![false; names.len()];

    for instruction in ansatz.circuit().instructions() {
        state.apply(instruction, &bound)?;
        for (k, derivative) in derivatives.iter_mut().enumerate() {
            if active[k] {
                derivative.apply(instruction, &bound)?;
            }
        }

        let Some(gate) = instruction.as_gate() else {
            continue;
        };
        let Some(angle) = gate.parameter() else {
            continue;
        };
        let Some(generator) = rotation_generator(gate, &instruction.qubits) else {
            continue;
        };

        let mut p_state: Option<Statevector> = None;
        for symbol in angle.symbols() {
            let Some(&k) = index.get(symbol.as_str()) else {
                continue;
            };
            let slope = angle.derivative(&symbol).evaluate(&bound)?;
            if slope == 0.0 {
                continue;
            }
            if p_state.is_none() {
                let mut s = state.clone();
                s.apply_pauli(&generator)?;
                p_state = Some(s);
            }
            if let Some(rotated) = &p_state {
                derivatives[k].add_scaled(Complex64::new(0.0, -0.5 * slope), rotated)?;
                active[k] = true;
            }
        }
    }

    Ok(TangentStates { state, derivatives })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansatz::{TwoLocal, TwoLocalConfig};

    #[test]
    fn test_single_ry_derivative() {
        // ψ = Ry(θ)|0⟩ = (cos θ/2, sin θ/2), ∂ψ = ½(-sin θ/2, cos θ/2).
        let ansatz = TwoLocal::new(
            1,
            TwoLocalConfig {
                reps: 0,
                ..TwoLocalConfig::default()
            },
        )
        .unwrap();
        let theta = 0.7;
        let tangent = tangent_states(&ansatz, &[theta]).unwrap();
        let d = tangent.derivatives[0].amplitudes();
        assert!((d[0].re + 0.5 * (theta / 2.0).sin()).abs() < 1e-12);
        assert!((d[1].re - 0.5 * (theta / 2.0).cos()).abs() < 1e-12);
        assert!(d[0].im.abs() < 1e-12 && d[1].im.abs() < 1e-12);
    }
}
