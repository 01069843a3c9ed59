//! Quantum gate types.

use serde::{Deserialize, Serialize};

use crate::parameter::ParameterExpression;

/// Gates understood by the simulator.
///
/// Every parameterised gate is a Pauli rotation `exp(-iθ/2 · P)`, which is
/// what lets the evolver differentiate circuits exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// `exp(-iθ/2 · X⊗Y)`: X on the first operand, Y on the second.
    RXY(ParameterExpression),
    /// `exp(-iθ/2 · Y⊗X)`: Y on the first operand, X on the second.
    RYX(ParameterExpression),
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
            StandardGate::RXY(_) => "rxy",
            StandardGate::RYX(_) => "ryx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_) => 1,

            StandardGate::CX | StandardGate::CZ | StandardGate::RXY(_) | StandardGate::RYX(_) => 2,
        }
    }

    /// The rotation angle, for parameterised gates.
    pub fn parameter(&self) -> Option<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::RXY(p)
            | StandardGate::RYX(p) => Some(p),
            _ => None,
        }
    }

    /// Check if this gate has an unbound symbolic angle.
    pub fn is_parameterized(&self) -> bool {
        self.parameter().is_some_and(ParameterExpression::is_symbolic)
    }

    /// Rebuild the gate with its angle replaced by `f(angle)`.
    #[must_use]
    pub fn map_parameter(&self, f: impl FnOnce(&ParameterExpression) -> ParameterExpression) -> Self {
        match self {
            StandardGate::Rx(p) => StandardGate::Rx(f(p)),
            StandardGate::Ry(p) => StandardGate::Ry(f(p)),
            StandardGate::Rz(p) => StandardGate::Rz(f(p)),
            StandardGate::RXY(p) => StandardGate::RXY(f(p)),
            StandardGate::RYX(p) => StandardGate::RYX(f(p)),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::RXY(ParameterExpression::constant(0.1)).num_qubits(), 2);

        assert!(!StandardGate::H.is_parameterized());
        assert!(!StandardGate::Rx(ParameterExpression::constant(PI)).is_parameterized());
        assert!(StandardGate::Rx(ParameterExpression::symbol("theta")).is_parameterized());
    }

    #[test]
    fn test_map_parameter() {
        let gate = StandardGate::RYX(ParameterExpression::symbol("x_3"));
        let bound = gate.map_parameter(|p| p.bind("x_3", 0.5));
        assert_eq!(bound.parameter().and_then(ParameterExpression::as_f64), Some(0.5));
        assert_eq!(bound.name(), "ryx");

        let cx = StandardGate::CX.map_parameter(|_| ParameterExpression::constant(1.0));
        assert_eq!(cx, StandardGate::CX);
    }
}
