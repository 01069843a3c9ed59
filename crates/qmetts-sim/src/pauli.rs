//! Pauli strings.
//!
//! A [`PauliString`] is a tensor product of single-qubit Pauli operators,
//! stored sparsely as sorted `(qubit, op)` pairs. Dense labels follow the
//! usual convention where the rightmost character acts on qubit 0:
//!
//! ```rust
//! use qmetts_sim::pauli::{PauliOp, PauliString};
//!
//! let p = PauliString::from_label("XIZ").unwrap();
//! assert_eq!(p.ops(), &[(0, PauliOp::Z), (2, PauliOp::X)]);
//! assert_eq!(p.to_label(3), "XIZ");
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use qmetts_ir::{QubitId, StandardGate};

use crate::error::{SimError, SimResult};

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliOp {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl PauliOp {
    /// Parse `I`, `X`, `Y` or `Z` (case-insensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(PauliOp::I),
            'X' => Some(PauliOp::X),
            'Y' => Some(PauliOp::Y),
            'Z' => Some(PauliOp::Z),
            _ => None,
        }
    }

    /// Upper-case label character.
    pub fn as_char(self) -> char {
        match self {
            PauliOp::I => 'I',
            PauliOp::X => 'X',
            PauliOp::Y => 'Y',
            PauliOp::Z => 'Z',
        }
    }
}

/// A tensor product of Pauli operators on named qubits.
///
/// Identity factors are omitted; qubits not listed are implicitly I.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PauliString {
    /// Non-identity terms, sorted by qubit index ascending.
    ops: Vec<(u32, PauliOp)>,
}

impl PauliString {
    /// Construct a PauliString from an iterator of (qubit, op) pairs.
    ///
    /// Identity operators are dropped; the remaining ops are sorted by qubit.
    pub fn from_ops(ops: impl IntoIterator<Item = (u32, PauliOp)>) -> Self {
        let mut v: Vec<(u32, PauliOp)> = ops
            .into_iter()
            .filter(|(_, op)| *op != PauliOp::I)
            .collect();
        v.sort_by_key(|(q, _)| *q);
        Self { ops: v }
    }

    /// The identity string.
    pub fn identity() -> Self {
        Self { ops: vec![] }
    }

    /// Parse a dense label such as `"IXXI"`; the last character is qubit 0.
    pub fn from_label(label: &str) -> SimResult<Self> {
        let n = label.chars().count() as u32;
        let mut ops = Vec::with_capacity(label.len());
        for (pos, c) in label.chars().enumerate() {
            let op = PauliOp::from_char(c).ok_or_else(|| SimError::InvalidLabel {
                label: label.to_string(),
                reason: format!("'{c}' is not a Pauli operator"),
            })?;
            ops.push((n - 1 - pos as u32, op));
        }
        Ok(Self::from_ops(ops))
    }

    /// Dense label over `num_qubits` qubits, qubit 0 rightmost.
    pub fn to_label(&self, num_qubits: u32) -> String {
        let mut chars = vec!['I'; num_qubits as usize];
        for &(q, op) in &self.ops {
            if q < num_qubits {
                chars[(num_qubits - 1 - q) as usize] = op.as_char();
            }
        }
        chars.into_iter().collect()
    }

    /// Return the non-identity (qubit, op) pairs, sorted by qubit index.
    pub fn ops(&self) -> &[(u32, PauliOp)] {
        &self.ops
    }

    /// True if there are no non-identity operators.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// The highest qubit index referenced, or `None` for an identity string.
    pub fn max_qubit(&self) -> Option<u32> {
        self.ops.last().map(|(q, _)| *q)
    }

    /// The same string acting on qubits moved up by `offset`.
    #[must_use]
    pub fn shifted(&self, offset: u32) -> Self {
        Self {
            ops: self.ops.iter().map(|&(q, op)| (q + offset, op)).collect(),
        }
    }

    /// Bit masks describing the action on basis states.
    ///
    /// Returns `(flip, phase, n_y)`: X and Y flip a bit, Y and Z pick up a
    /// sign on `|1⟩`, and every Y contributes a factor `i`.
    pub fn masks(&self) -> (usize, usize, u32) {
        let mut flip = 0usize;
        let mut phase = 0usize;
        let mut n_y = 0u32;
        for &(q, op) in &self.ops {
            let bit = 1usize << q;
            match op {
                PauliOp::I => {}
                PauliOp::X => flip |= bit,
                PauliOp::Y => {
                    flip |= bit;
                    phase |= bit;
                    n_y += 1;
                }
                PauliOp::Z => phase |= bit,
            }
        }
        (flip, phase, n_y)
    }

    /// `P|index⟩ = coefficient · |target⟩`, returned as `(target, coefficient)`.
    #[inline]
    pub fn apply_to_basis(&self, index: usize) -> (usize, Complex64) {
        let (flip, phase, n_y) = self.masks();
        (index ^ flip, basis_phase(index, phase, n_y))
    }
}

/// `i^n_y · (-1)^{popcount(index & phase)}`.
#[inline]
pub(crate) fn basis_phase(index: usize, phase: usize, n_y: u32) -> Complex64 {
    let i_pow = match n_y % 4 {
        0 => Complex64::new(1.0, 0.0),
        1 => Complex64::new(0.0, 1.0),
        2 => Complex64::new(-1.0, 0.0),
        _ => Complex64::new(0.0, -1.0),
    };
    if (index & phase).count_ones() % 2 == 1 {
        -i_pow
    } else {
        i_pow
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return write!(f, "I");
        }
        for (i, (q, op)) in self.ops.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}{}", op.as_char(), q)?;
        }
        Ok(())
    }
}

/// The Pauli generator `P` of a rotation gate `exp(-iθ/2 · P)`.
///
/// Returns `None` for gates without an angle.
pub fn rotation_generator(gate: &StandardGate, qubits: &[QubitId]) -> Option<PauliString> {
    let on = |i: usize, op| (qubits[i].0, op);
    match gate {
        StandardGate::Rx(_) => Some(PauliString::from_ops([on(0, PauliOp::X)])),
        StandardGate::Ry(_) => Some(PauliString::from_ops([on(0, PauliOp::Y)])),
        StandardGate::Rz(_) => Some(PauliString::from_ops([on(0, PauliOp::Z)])),
        StandardGate::RXY(_) => Some(PauliString::from_ops([
            on(0, PauliOp::X),
            on(1, PauliOp::Y),
        ])),
        StandardGate::RYX(_) => Some(PauliString::from_ops([
            on(0, PauliOp::Y),
            on(1, PauliOp::X),
        ])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmetts_ir::ParameterExpression;

    #[test]
    fn test_label_round_trip() {
        let p = PauliString::from_label("YIXZ").unwrap();
        assert_eq!(p.to_label(4), "YIXZ");
        assert_eq!(p.max_qubit(), Some(3));
    }

    #[test]
    fn test_invalid_label() {
        assert!(matches!(
            PauliString::from_label("XQ"),
            Err(SimError::InvalidLabel { .. })
        ));
    }

    #[test]
    fn test_y_on_basis_states() {
        let y = PauliString::from_ops([(0, PauliOp::Y)]);
        // Y|0⟩ = i|1⟩, Y|1⟩ = -i|0⟩
        assert_eq!(y.apply_to_basis(0), (1, Complex64::new(0.0, 1.0)));
        assert_eq!(y.apply_to_basis(1), (0, Complex64::new(0.0, -1.0)));
    }

    #[test]
    fn test_zz_phase() {
        let zz = PauliString::from_label("ZZ").unwrap();
        assert_eq!(zz.apply_to_basis(0b01).1, Complex64::new(-1.0, 0.0));
        assert_eq!(zz.apply_to_basis(0b11).1, Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_rotation_generator() {
        let gate = StandardGate::RYX(ParameterExpression::symbol("t"));
        let g = rotation_generator(&gate, &[QubitId(2), QubitId(0)]).unwrap();
        assert_eq!(g.ops(), &[(0, PauliOp::X), (2, PauliOp::Y)]);
        assert!(rotation_generator(&StandardGate::CX, &[QubitId(0), QubitId(1)]).is_none());
    }

    #[test]
    fn test_display() {
        let p = PauliString::from_label("XIZ").unwrap();
        assert_eq!(p.to_string(), "Z0 X2");
        assert_eq!(PauliString::identity().to_string(), "I");
    }
}
