//! Statevector simulation engine.
//!
//! Amplitude `k` belongs to the basis state whose bit `q` is the value of
//! qubit `q`. Gates act in place with bitmask loops.

use nalgebra::DMatrix;
use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use qmetts_ir::{Circuit, Instruction, InstructionKind, ParameterValues, QubitId, StandardGate};

use crate::error::{SimError, SimResult};
use crate::pauli::{PauliString, basis_phase, rotation_generator};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// A pure quantum state on `num_qubits` qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![ZERO; size];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Wrap raw amplitudes. The vector is not renormalized.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> SimResult<Self> {
        let len = amplitudes.len();
        if len == 0 || !len.is_power_of_two() {
            return Err(SimError::InvalidAmplitudes(len));
        }
        Ok(Self {
            num_qubits: len.trailing_zeros() as usize,
            amplitudes,
        })
    }

    /// Product state from a label over `0 1 + -`; character `i` is qubit `i`.
    pub fn from_label(label: &str) -> SimResult<Self> {
        let n = label.chars().count();
        let mut single = Vec::with_capacity(n);
        for c in label.chars() {
            let pair = match c {
                '0' => [ONE, ZERO],
                '1' => [ZERO, ONE],
                '+' => [Complex64::from(FRAC_1_SQRT_2), Complex64::from(FRAC_1_SQRT_2)],
                '-' => [Complex64::from(FRAC_1_SQRT_2), Complex64::from(-FRAC_1_SQRT_2)],
                other => {
                    return Err(SimError::InvalidLabel {
                        label: label.to_string(),
                        reason: format!("'{other}' is not one of 0, 1, +, -"),
                    });
                }
            };
            single.push(pair);
        }

        let amplitudes = (0..1usize << n)
            .map(|index| {
                single
                    .iter()
                    .enumerate()
                    .fold(ONE, |acc, (q, pair)| acc * pair[(index >> q) & 1])
            })
            .collect();
        Ok(Self {
            amplitudes,
            num_qubits: n,
        })
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The amplitudes in basis-index order.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Consume the state and return its amplitudes.
    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.amplitudes
            .iter()
            .map(Complex64::norm_sqr)
            .sum::<f64>()
            .sqrt()
    }

    /// Rescale to unit norm.
    pub fn normalize(&mut self) -> SimResult<()> {
        let norm = self.norm();
        if norm == 0.0 {
            return Err(SimError::ZeroNorm);
        }
        for amp in &mut self.amplitudes {
            *amp /= norm;
        }
        Ok(())
    }

    fn check_width(&self, other: usize) -> SimResult<()> {
        if self.num_qubits == other {
            Ok(())
        } else {
            Err(SimError::DimensionMismatch {
                expected: self.num_qubits,
                got: other,
            })
        }
    }

    /// `⟨self|other⟩`.
    pub fn inner(&self, other: &Statevector) -> SimResult<Complex64> {
        self.check_width(other.num_qubits)?;
        Ok(inner_product(&self.amplitudes, &other.amplitudes))
    }

    /// `|⟨self|other⟩|²`.
    pub fn fidelity(&self, other: &Statevector) -> SimResult<f64> {
        Ok(self.inner(other)?.norm_sqr())
    }

    /// `self += scale · other`. The result is not renormalized.
    pub fn add_scaled(&mut self, scale: Complex64, other: &Statevector) -> SimResult<()> {
        self.check_width(other.num_qubits)?;
        for (a, b) in self.amplitudes.iter_mut().zip(&other.amplitudes) {
            *a += scale * b;
        }
        Ok(())
    }

    // =========================================================================
    // Circuit execution
    // =========================================================================

    /// Run `circuit` on this state with symbols taken from `values`.
    pub fn evolve(&mut self, circuit: &Circuit, values: &ParameterValues) -> SimResult<()> {
        self.check_width(circuit.num_qubits())?;
        for instruction in circuit.instructions() {
            self.apply(instruction, values)?;
        }
        Ok(())
    }

    /// Apply an instruction to the statevector.
    pub fn apply(&mut self, instruction: &Instruction, values: &ParameterValues) -> SimResult<()> {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let qubits: Vec<_> = instruction.qubits.iter().map(|q| q.index()).collect();
                if let Some(&q) = qubits.iter().find(|&&q| q >= self.num_qubits) {
                    return Err(SimError::QubitOutOfRange {
                        qubit: q as u32,
                        n_qubits: self.num_qubits as u32,
                    });
                }
                let angle = match gate.parameter() {
                    Some(p) => p.evaluate(values)?,
                    None => 0.0,
                };
                self.apply_gate(gate, &qubits, angle)?;
            }
            // Sampling happens on the final state.
            InstructionKind::Measure | InstructionKind::Barrier => {}
        }
        Ok(())
    }

    fn apply_gate(&mut self, gate: &StandardGate, qubits: &[usize], angle: f64) -> SimResult<()> {
        match gate {
            StandardGate::I => {}
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Y => self.apply_y(qubits[0]),
            StandardGate::Z => self.apply_z(qubits[0]),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::S => self.apply_phase(qubits[0], PI / 2.0),
            StandardGate::Sdg => self.apply_phase(qubits[0], -PI / 2.0),
            StandardGate::Rx(_) => self.apply_rx(qubits[0], angle),
            StandardGate::Ry(_) => self.apply_ry(qubits[0], angle),
            StandardGate::Rz(_) => self.apply_rz(qubits[0], angle),
            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CZ => self.apply_cz(qubits[0], qubits[1]),
            StandardGate::RXY(_) | StandardGate::RYX(_) => {
                let ids: Vec<_> = qubits.iter().map(|&q| QubitId::from(q)).collect();
                if let Some(generator) = rotation_generator(gate, &ids) {
                    self.apply_pauli_rotation(&generator, angle)?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Pauli actions
    // =========================================================================

    fn check_pauli(&self, pauli: &PauliString) -> SimResult<()> {
        match pauli.max_qubit() {
            Some(q) if q as usize >= self.num_qubits => Err(SimError::QubitOutOfRange {
                qubit: q,
                n_qubits: self.num_qubits as u32,
            }),
            _ => Ok(()),
        }
    }

    /// Apply `P` in place.
    pub fn apply_pauli(&mut self, pauli: &PauliString) -> SimResult<()> {
        self.check_pauli(pauli)?;
        let (flip, phase, n_y) = pauli.masks();
        let mut out = vec![ZERO; self.amplitudes.len()];
        for (i, amp) in self.amplitudes.iter().enumerate() {
            out[i ^ flip] = basis_phase(i, phase, n_y) * amp;
        }
        self.amplitudes = out;
        Ok(())
    }

    /// Apply `exp(-iθ/2 · P) = cos(θ/2) - i sin(θ/2) P` in place.
    pub fn apply_pauli_rotation(&mut self, pauli: &PauliString, theta: f64) -> SimResult<()> {
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        let mut rotated = self.clone();
        rotated.apply_pauli(pauli)?;
        for (amp, p_amp) in self.amplitudes.iter_mut().zip(rotated.amplitudes) {
            *amp = c * *amp + neg_i_s * p_amp;
        }
        Ok(())
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_z(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask != 0 {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = FRAC_1_SQRT_2 * (a + b);
                self.amplitudes[j] = FRAC_1_SQRT_2 * (a - b);
            }
        }
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for i in 0..(1 << self.num_qubits) {
            if i & mask != 0 {
                self.amplitudes[i] *= phase;
            }
        }
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                self.amplitudes[i] *= phase_0;
            } else {
                self.amplitudes[i] *= phase_1;
            }
        }
    }

    // =========================================================================
    // Two-qubit gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask != 0) {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    // =========================================================================
    // Measurement statistics
    // =========================================================================

    /// Born-rule probabilities of every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Marginal distribution over `qubits`; bit `k` of an outcome is `qubits[k]`.
    pub fn marginal_probabilities(&self, qubits: &[usize]) -> SimResult<Vec<f64>> {
        if let Some(&q) = qubits.iter().find(|&&q| q >= self.num_qubits) {
            return Err(SimError::QubitOutOfRange {
                qubit: q as u32,
                n_qubits: self.num_qubits as u32,
            });
        }
        let mut marginal = vec![0.0; 1 << qubits.len()];
        for (i, amp) in self.amplitudes.iter().enumerate() {
            marginal[extract_bits(i, qubits)] += amp.norm_sqr();
        }
        Ok(marginal)
    }

    /// Reduced density matrix on `keep`, tracing out every other qubit.
    ///
    /// Row/column bit `k` refers to `keep[k]`.
    pub fn reduced_density_matrix(&self, keep: &[usize]) -> SimResult<DMatrix<Complex64>> {
        if let Some(&q) = keep.iter().find(|&&q| q >= self.num_qubits) {
            return Err(SimError::QubitOutOfRange {
                qubit: q as u32,
                n_qubits: self.num_qubits as u32,
            });
        }
        let traced: Vec<usize> = (0..self.num_qubits).filter(|q| !keep.contains(q)).collect();
        let dim = 1 << keep.len();
        let mut blocks = vec![vec![ZERO; dim]; 1 << traced.len()];
        for (i, amp) in self.amplitudes.iter().enumerate() {
            blocks[extract_bits(i, &traced)][extract_bits(i, keep)] = *amp;
        }
        let mut rho = DMatrix::from_element(dim, dim, ZERO);
        for block in &blocks {
            for a in 0..dim {
                for b in 0..dim {
                    rho[(a, b)] += block[a] * block[b].conj();
                }
            }
        }
        Ok(rho)
    }

    /// Sample one computational-basis outcome.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SimResult<usize> {
        let total: f64 = self.amplitudes.iter().map(Complex64::norm_sqr).sum();
        if total == 0.0 {
            return Err(SimError::ZeroNorm);
        }
        let r: f64 = rng.r#gen::<f64>() * total;

        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return Ok(i);
            }
        }

        // Rounding can leave r just above the final cumulative sum.
        Ok(self
            .amplitudes
            .iter()
            .rposition(|a| a.norm_sqr() > 0.0)
            .unwrap_or(self.amplitudes.len() - 1))
    }

    /// Convert measurement outcome to a bitstring with qubit 0 first.
    pub fn outcome_to_bitstring(&self, outcome: usize) -> String {
        format!("{:0width$b}", outcome, width = self.num_qubits)
            .chars()
            .rev()
            .collect()
    }
}

/// `Σ conj(a_i) b_i`.
#[inline]
pub fn inner_product(a: &[Complex64], b: &[Complex64]) -> Complex64 {
    a.iter().zip(b).map(|(x, y)| x.conj() * y).sum()
}

/// Gather the bits of `index` at positions `qubits` into a compact integer.
#[inline]
fn extract_bits(index: usize, qubits: &[usize]) -> usize {
    qubits
        .iter()
        .enumerate()
        .fold(0, |acc, (k, &q)| acc | (((index >> q) & 1) << k))
}
