//! Tests for parameter handling across whole circuits.

use proptest::prelude::*;
use qmetts_ir::{Circuit, IrError, ParameterExpression, QubitId, bind_values};

// ---------------------------------------------------------------------------
// Parameter ordering
// ---------------------------------------------------------------------------

#[test]
fn parameters_follow_first_appearance() {
    let mut circuit = Circuit::with_size("order", 2);
    circuit
        .ry(ParameterExpression::symbol("b"), QubitId(0))
        .unwrap()
        .ry(ParameterExpression::symbol("a"), QubitId(1))
        .unwrap()
        .rz(ParameterExpression::symbol("b"), QubitId(1))
        .unwrap();
    assert_eq!(circuit.parameters(), vec!["b".to_string(), "a".to_string()]);
    assert_eq!(circuit.num_parameters(), 2);
}

#[test]
fn shared_expression_contributes_each_symbol_once() {
    let mut circuit = Circuit::with_size("shared", 1);
    let expr = ParameterExpression::symbol("t") * ParameterExpression::constant(2.0)
        + ParameterExpression::symbol("t");
    circuit.rx(expr, QubitId(0)).unwrap();
    assert_eq!(circuit.parameters(), vec!["t".to_string()]);
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

#[test]
fn assign_evaluates_expressions() {
    let mut circuit = Circuit::with_size("bind", 1);
    circuit
        .rx(
            ParameterExpression::symbol("t") / ParameterExpression::constant(2.0),
            QubitId(0),
        )
        .unwrap();
    let bound = circuit
        .assign_parameters(&bind_values(&["t".to_string()], &[3.0]))
        .unwrap();
    let angle = bound.instructions()[0]
        .as_gate()
        .and_then(|g| g.parameter())
        .and_then(ParameterExpression::as_f64)
        .unwrap();
    assert!((angle - 1.5).abs() < 1e-12);
}

#[test]
fn assign_rejects_non_finite_angles() {
    let mut circuit = Circuit::with_size("bind", 1);
    circuit
        .rx(
            ParameterExpression::constant(1.0) / ParameterExpression::symbol("t"),
            QubitId(0),
        )
        .unwrap();
    let err = circuit
        .assign_parameters(&bind_values(&["t".to_string()], &[0.0]))
        .unwrap_err();
    assert!(matches!(err, IrError::NonFiniteParameter(_)));
}

// ---------------------------------------------------------------------------
// Depth
// ---------------------------------------------------------------------------

#[test]
fn barrier_synchronises_without_adding_depth() {
    let mut circuit = Circuit::with_size("depth", 2);
    circuit.h(QubitId(0)).unwrap();
    circuit.barrier_all().unwrap();
    circuit.h(QubitId(1)).unwrap();
    assert_eq!(circuit.depth(), 2);
}

proptest! {
    #[test]
    fn depth_never_exceeds_gate_count(ops in proptest::collection::vec((0u32..4, 0u32..4), 0..40)) {
        let mut circuit = Circuit::with_size("random", 4);
        for (a, b) in ops {
            if a == b {
                circuit.h(QubitId(a)).unwrap();
            } else {
                circuit.cx(QubitId(a), QubitId(b)).unwrap();
            }
        }
        prop_assert!(circuit.depth() <= circuit.num_ops());
    }
}
