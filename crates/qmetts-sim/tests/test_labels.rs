//! Tests for product-state labels and random product measurements.

use rand::SeedableRng;
use rand::rngs::StdRng;

use qmetts_sim::{
    LabelFlag, MeasureLabel, PauliOperator, StateLabel, Statevector, choose_state, exp_value,
    generate_basis_list, generate_basis_measure_list,
};

fn ops(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[test]
fn all_possible_basis_list_size() {
    let list = generate_basis_list(3, &ops(&["x", "z"]), LabelFlag::AllPossible).unwrap();
    assert_eq!(list.len(), 64);
    let measures = generate_basis_measure_list(3, &ops(&["x", "z"]), LabelFlag::AllPossible).unwrap();
    assert_eq!(measures.len(), 8);
}

#[test]
fn every_qubit_same_covers_both_bases() {
    let list = generate_basis_list(2, &ops(&["x", "z"]), LabelFlag::EveryQubitSame).unwrap();
    assert_eq!(list.len(), 8);
    let measures =
        generate_basis_measure_list(2, &ops(&["x", "z"]), LabelFlag::EveryQubitSame).unwrap();
    let names: Vec<_> = measures.iter().map(MeasureLabel::as_str).collect();
    assert_eq!(names, vec!["xx", "zz"]);
}

#[test]
fn manual_basis_list_deduplicates() {
    let list = generate_basis_list(2, &ops(&["zz", "zz"]), LabelFlag::Manual).unwrap();
    let names: Vec<_> = list.iter().map(StateLabel::as_str).collect();
    assert_eq!(names, vec!["00", "01", "10", "11"]);
}

#[test]
fn single_basis_required_for_generated_lists() {
    assert!(generate_basis_list(2, &ops(&["xz"]), LabelFlag::AllPossible).is_err());
    assert!(generate_basis_measure_list(2, &ops(&["y"]), LabelFlag::EveryQubitSame).is_err());
}

#[test]
fn flag_from_str() {
    assert_eq!("manual".parse::<LabelFlag>().unwrap(), LabelFlag::Manual);
    assert_eq!(
        "every_qbit_same".parse::<LabelFlag>().unwrap(),
        LabelFlag::EveryQubitSame
    );
    assert!("sometimes".parse::<LabelFlag>().is_err());
}

#[test]
fn flag_deserializes_both_spellings() {
    for text in ["\"every_qbit_same\"", "\"every_qubit_same\""] {
        let flag: LabelFlag = serde_json::from_str(text).unwrap();
        assert_eq!(flag, LabelFlag::EveryQubitSame);
    }
    assert_eq!(
        serde_json::to_string(&LabelFlag::EveryQubitSame).unwrap(),
        "\"every_qubit_same\""
    );
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

#[test]
fn measurement_circuit_rotates_x_qubits() {
    let circuit = MeasureLabel::new("xzx").unwrap().circuit().unwrap();
    let counts = circuit.count_ops();
    assert_eq!(counts.get("h"), Some(&2));
    assert_eq!(circuit.instructions().last().map(|i| i.name()), Some("measure"));
}

#[test]
fn state_label_prepares_its_state() {
    let label = StateLabel::new("-1+0").unwrap();
    let state = label.statevector();
    let h = PauliOperator::from_list(&[("IIIX", 1.0)]).unwrap();
    // Qubit 0 is '-'.
    assert!((exp_value(&state, &h).unwrap() + 1.0).abs() < 1e-12);
}

#[test]
fn choose_state_frequencies_follow_born_rule() {
    // |0⟩ measured in x collapses to + or - with equal probability.
    let state = Statevector::new(1);
    let measures = vec![MeasureLabel::new("x").unwrap()];
    let mut rng = StdRng::seed_from_u64(7);
    let plus = (0..2000)
        .filter(|_| choose_state(&state, &measures, &mut rng).unwrap().1.as_str() == "+")
        .count();
    assert!((800..1200).contains(&plus), "got {plus} '+' outcomes");
}

#[test]
fn choose_state_picks_from_every_measurement() {
    let state = Statevector::from_label("0+").unwrap();
    let measures = generate_basis_measure_list(2, &ops(&["x", "z"]), LabelFlag::AllPossible).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let (measure, label) = choose_state(&state, &measures, &mut rng).unwrap();
        assert!(measure.eigenstates().contains(&label));
        // Qubit 0 is |0⟩ and qubit 1 is |+⟩: z on 0 and x on 1 are deterministic.
        match measure.as_str() {
            "zx" => assert_eq!(label.as_str(), "0+"),
            "zz" => assert!(label.as_str().starts_with('0')),
            "xx" => assert!(label.as_str().ends_with('+')),
            _ => {}
        }
    }
}

#[test]
fn choose_state_needs_a_measurement() {
    let state = Statevector::new(1);
    let mut rng = StdRng::seed_from_u64(0);
    assert!(choose_state(&state, &[], &mut rng).is_err());
}
