//! High-level circuit builder API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::{ParameterExpression, ParameterValues};
use crate::qubit::QubitId;

/// A quantum circuit.
///
/// Instructions are kept in program order on a fixed register; the
/// simulator walks them front to back, which is all a variational ansatz
/// needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Register width.
    num_qubits: u32,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit with no qubits.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_size(name, 0)
    }

    /// Create a circuit on `num_qubits` qubits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            instructions: vec![],
        }
    }

    /// Validate and append an instruction.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        let gate_name = instruction.as_gate().map(|g| g.name().to_string());

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = instruction.qubits.len() as u32;
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        for (i, &qubit) in instruction.qubits.iter().enumerate() {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
            if instruction.qubits[..i].contains(&qubit) {
                return Err(IrError::DuplicateQubit { qubit, gate_name });
            }
        }

        self.instructions.push(instruction);
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Sdg, qubit))
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Rx(theta.into()),
            qubit,
        ))
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Ry(theta.into()),
            qubit,
        ))
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Rz(theta.into()),
            qubit,
        ))
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply `exp(-iθ/2 · X_a Y_b)`.
    pub fn rxy(
        &mut self,
        theta: impl Into<ParameterExpression>,
        a: QubitId,
        b: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::RXY(theta.into()),
            a,
            b,
        ))
    }

    /// Apply `exp(-iθ/2 · Y_a X_b)`.
    pub fn ryx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        a: QubitId,
        b: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::RYX(theta.into()),
            a,
            b,
        ))
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply an arbitrary standard gate.
    pub fn gate(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Measure every qubit.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = (0..self.num_qubits).map(QubitId).collect();
        self.apply(Instruction::measure(qubits))
    }

    /// Apply a barrier to all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = (0..self.num_qubits).map(QubitId).collect();
        self.apply(Instruction::barrier(qubits))
    }

    /// Append `other` so that its qubit `i` lands on qubit `offset + i`.
    pub fn compose(&mut self, other: &Circuit, offset: u32) -> IrResult<&mut Self> {
        if offset as usize + other.num_qubits() > self.num_qubits() {
            return Err(IrError::ComposeOutOfRange {
                other: other.num_qubits(),
                offset,
                width: self.num_qubits(),
            });
        }
        for inst in &other.instructions {
            self.apply(inst.shifted(offset))?;
        }
        Ok(self)
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Symbol names used by the circuit, in order of first appearance.
    pub fn parameters(&self) -> Vec<String> {
        let mut names = Vec::new();
        for gate in self.instructions.iter().filter_map(Instruction::as_gate) {
            if let Some(p) = gate.parameter() {
                p.collect_symbols(&mut names);
            }
        }
        names
    }

    /// Number of distinct symbols.
    pub fn num_parameters(&self) -> usize {
        self.parameters().len()
    }

    /// Check if any gate angle is still symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.instructions
            .iter()
            .filter_map(Instruction::as_gate)
            .any(StandardGate::is_parameterized)
    }

    /// Return a copy with every angle evaluated to a constant.
    ///
    /// Fails if a symbol has no value in `values`.
    pub fn assign_parameters(&self, values: &ParameterValues) -> IrResult<Circuit> {
        let mut instructions = Vec::with_capacity(self.instructions.len());
        for inst in &self.instructions {
            let kind = match &inst.kind {
                InstructionKind::Gate(gate) => match gate.parameter() {
                    Some(p) => {
                        let value = p.evaluate(values)?;
                        InstructionKind::Gate(
                            gate.map_parameter(|_| ParameterExpression::constant(value)),
                        )
                    }
                    None => inst.kind.clone(),
                },
                other => other.clone(),
            };
            instructions.push(Instruction {
                kind,
                qubits: inst.qubits.clone(),
            });
        }
        Ok(Circuit {
            name: self.name.clone(),
            num_qubits: self.num_qubits,
            instructions,
        })
    }

    /// Return a copy with the symbol `from` renamed to `to`.
    #[must_use]
    pub fn rename_parameter(&self, from: &str, to: &str) -> Circuit {
        let instructions = self
            .instructions
            .iter()
            .map(|inst| match &inst.kind {
                InstructionKind::Gate(gate) => Instruction {
                    kind: InstructionKind::Gate(gate.map_parameter(|p| p.rename(from, to))),
                    qubits: inst.qubits.clone(),
                },
                _ => inst.clone(),
            })
            .collect();
        Circuit {
            name: self.name.clone(),
            num_qubits: self.num_qubits,
            instructions,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of gate instructions.
    pub fn num_ops(&self) -> usize {
        self.instructions.iter().filter(|i| i.as_gate().is_some()).count()
    }

    /// Gate counts by name.
    pub fn count_ops(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for gate in self.instructions.iter().filter_map(Instruction::as_gate) {
            *counts.entry(gate.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Get the circuit depth.
    ///
    /// Barriers synchronise their qubits without adding a layer.
    pub fn depth(&self) -> usize {
        let mut levels = vec![0usize; self.num_qubits()];
        for inst in &self.instructions {
            let front = inst
                .qubits
                .iter()
                .map(|q| levels[q.index()])
                .max()
                .unwrap_or(0);
            let next = match inst.kind {
                InstructionKind::Barrier => front,
                _ => front + 1,
            };
            for q in &inst.qubits {
                levels[q.index()] = next;
            }
        }
        levels.into_iter().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::bind_values;
    use std::f64::consts::PI;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.depth(), 0);
    }

    #[test]
    fn test_fluent_api() {
        let mut circuit = Circuit::with_size("test", 2);
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .measure_all()
            .unwrap();

        assert_eq!(circuit.depth(), 3);
        assert_eq!(circuit.num_ops(), 2);
    }

    #[test]
    fn test_parameterized_gate() {
        let mut circuit = Circuit::with_size("test", 1);
        circuit.rx(PI / 2.0, QubitId(0)).unwrap();
        circuit
            .ry(ParameterExpression::symbol("theta"), QubitId(0))
            .unwrap();

        assert_eq!(circuit.depth(), 2);
        assert!(circuit.is_parameterized());
        assert_eq!(circuit.parameters(), vec!["theta".to_string()]);
    }

    #[test]
    fn test_out_of_range_qubit() {
        let mut circuit = Circuit::with_size("test", 2);
        let err = circuit.h(QubitId(2)).unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { qubit: QubitId(2), .. }));
    }

    #[test]
    fn test_duplicate_qubit() {
        let mut circuit = Circuit::with_size("test", 2);
        let err = circuit.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let mut circuit = Circuit::with_size("test", 3);
        let err = circuit
            .gate(StandardGate::CX, [QubitId(0)])
            .unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch { expected: 2, got: 1, .. }
        ));
    }

    #[test]
    fn test_assign_parameters() {
        let mut circuit = Circuit::with_size("test", 2);
        circuit
            .rxy(ParameterExpression::symbol("x_0"), QubitId(0), QubitId(1))
            .unwrap()
            .ryx(ParameterExpression::symbol("x_1"), QubitId(0), QubitId(1))
            .unwrap();

        let names = circuit.parameters();
        let bound = circuit
            .assign_parameters(&bind_values(&names, &[0.1, 0.2]))
            .unwrap();
        assert!(!bound.is_parameterized());
        assert_eq!(bound.num_ops(), 2);

        let missing = circuit.assign_parameters(&bind_values(&names[..1], &[0.1]));
        assert!(matches!(missing, Err(IrError::UnboundParameter(name)) if name == "x_1"));
    }

    #[test]
    fn test_compose_with_offset() {
        let mut inner = Circuit::with_size("inner", 2);
        inner.cx(QubitId(0), QubitId(1)).unwrap();

        let mut outer = Circuit::with_size("outer", 4);
        outer.compose(&inner, 2).unwrap();
        assert_eq!(
            outer.instructions()[0].qubits,
            vec![QubitId(2), QubitId(3)]
        );

        assert!(matches!(
            outer.compose(&inner, 3),
            Err(IrError::ComposeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rename_parameter() {
        let mut circuit = Circuit::with_size("test", 1);
        circuit.ry(ParameterExpression::symbol("x_0"), QubitId(0)).unwrap();
        let renamed = circuit.rename_parameter("x_0", "xx_0");
        assert_eq!(renamed.parameters(), vec!["xx_0".to_string()]);
    }
}
