//! Tests for variational imaginary- and real-time evolution.

use num_complex::Complex64;
use qmetts_evolve::{
    Ansatz, EvolveError, EvolverConfig, ImaginaryTimeEvolver, OdeSolver, RealTimeEvolver,
    RotationBlock, TimeEvolutionProblem, TwoLocal, TwoLocalConfig, VarQite, VarQrte,
};
use qmetts_sim::{LmgModel, PauliOp, PauliOperator, Spectrum, StateLabel, Statevector};

fn single_qubit(blocks: Vec<RotationBlock>) -> Box<TwoLocal> {
    Box::new(
        TwoLocal::new(
            1,
            TwoLocalConfig {
                rotation_blocks: blocks,
                reps: 0,
                ..TwoLocalConfig::default()
            },
        )
        .unwrap(),
    )
}

// ---------------------------------------------------------------------------
// VarQITE
// ---------------------------------------------------------------------------

#[test]
fn qite_reaches_single_qubit_ground_state() {
    let h = PauliOperator::from_list(&[("X", -1.0)]).unwrap();
    let problem = TimeEvolutionProblem::new(h, 3.0).unwrap();
    let qite = VarQite::new(single_qubit(vec![RotationBlock::Ry]));
    let result = qite.evolve(&problem, &[0.0]).unwrap();

    assert_eq!(result.len(), 301);
    let e = *result.energies.last().unwrap();
    assert!((e + 1.0).abs() < 1e-4, "final energy {e}");
}

#[test]
fn qite_energy_decreases() {
    let model = LmgModel::new(3, 0.5, 0.8).unwrap();
    let ansatz = TwoLocal::new(
        3,
        TwoLocalConfig {
            reps: 2,
            ..TwoLocalConfig::default()
        },
    )
    .unwrap();
    let start = ansatz
        .product_state_parameters(&StateLabel::new("+-+").unwrap())
        .unwrap();
    let problem = TimeEvolutionProblem::new(model.hamiltonian().unwrap(), 0.5).unwrap();
    let qite = VarQite::new(Box::new(ansatz))
        .with_config(EvolverConfig::default().with_ode_solver(OdeSolver::Euler));
    let result = qite.evolve(&problem, &start).unwrap();

    assert_eq!(result.len(), 51);
    for pair in result.energies.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-3);
    }
    assert!(result.energies[50] < result.energies[0]);
    let e0 = model.spectrum().unwrap().ground_energy();
    assert!(result.energies[50] >= e0 - 1e-9);
}

#[test]
fn qite_records_aux_operators() {
    let model = LmgModel::new(2, 0.0, 1.0).unwrap();
    let problem = TimeEvolutionProblem::new(model.hamiltonian().unwrap(), 0.2)
        .unwrap()
        .with_aux_operator("mz", model.magnetization(PauliOp::Z).unwrap());
    let before = problem.hamiltonian().to_list();

    let ansatz = TwoLocal::new(2, TwoLocalConfig::default()).unwrap();
    let start = ansatz
        .product_state_parameters(&StateLabel::new("++").unwrap())
        .unwrap();
    let qite = VarQite::new(Box::new(ansatz))
        .with_config(EvolverConfig::default().with_num_timesteps(4));
    let result = qite.evolve(&problem, &start).unwrap();

    assert_eq!(result.observable_names, vec!["mz".to_string()]);
    assert_eq!(result.observables[0].len(), 5);
    assert_eq!(result.condition_numbers.len(), 4);
    assert!(result.observables[0][0].abs() < 1e-12);
    // The field pulls the magnetisation up.
    assert!(result.observables[0][4] > 0.0);
    assert_eq!(problem.hamiltonian().to_list(), before);
    assert!((result.times[4] - 0.2).abs() < 1e-12);
}

#[test]
fn qite_rejects_wrong_parameter_count() {
    let h = PauliOperator::from_list(&[("Z", 1.0)]).unwrap();
    let problem = TimeEvolutionProblem::new(h, 0.1).unwrap();
    let qite = VarQite::new(single_qubit(vec![RotationBlock::Ry]));
    assert!(matches!(
        qite.evolve(&problem, &[0.0, 1.0]),
        Err(EvolveError::ParameterCountMismatch { expected: 1, got: 2 })
    ));
}

#[test]
fn qite_reports_ill_conditioned_metric() {
    // Rz on |0⟩ only adds a global phase, so the metric is singular.
    let h = PauliOperator::from_list(&[("X", -1.0)]).unwrap();
    let problem = TimeEvolutionProblem::new(h, 0.05).unwrap();
    let blocks = vec![RotationBlock::Ry, RotationBlock::Rz];

    let strict = VarQite::new(single_qubit(blocks.clone())).with_config(
        EvolverConfig::default()
            .with_num_timesteps(5)
            .with_condition_threshold(10.0, true),
    );
    assert!(matches!(
        strict.evolve(&problem, &[0.0, 0.0]),
        Err(EvolveError::IllConditioned { step: 0, .. })
    ));

    let lenient = VarQite::new(single_qubit(blocks)).with_config(
        EvolverConfig::default()
            .with_num_timesteps(5)
            .with_condition_threshold(10.0, false),
    );
    let result = lenient.evolve(&problem, &[0.0, 0.0]).unwrap();
    assert_eq!(result.ill_conditioned_steps, vec![0, 1, 2, 3, 4]);
}

#[test]
fn qite_default_config_flags_singular_metric() {
    let h = PauliOperator::from_list(&[("X", -1.0)]).unwrap();
    let problem = TimeEvolutionProblem::new(h, 0.05).unwrap();
    let blocks = vec![RotationBlock::Ry, RotationBlock::Rz];

    let qite = VarQite::new(single_qubit(blocks.clone()))
        .with_config(EvolverConfig::default().with_num_timesteps(5));
    let result = qite.evolve(&problem, &[0.0, 0.0]).unwrap();

    // Only the starting point sits exactly on the Rz degeneracy.
    assert_eq!(result.ill_conditioned_steps, vec![0]);
    assert!(result.condition_numbers[0] > 1e10);
    assert!(result.condition_numbers[1..].iter().all(|c| *c < 1e10));

    let default = EvolverConfig::default();
    let strict = VarQite::new(single_qubit(blocks)).with_config(
        default
            .clone()
            .with_num_timesteps(5)
            .with_condition_threshold(default.condition_threshold, true),
    );
    assert!(matches!(
        strict.evolve(&problem, &[0.0, 0.0]),
        Err(EvolveError::IllConditioned { step: 0, .. })
    ));
}

// ---------------------------------------------------------------------------
// VarQRTE
// ---------------------------------------------------------------------------

fn exact_evolution(h: &PauliOperator, start: &Statevector, t: f64) -> Statevector {
    let spectrum = Spectrum::of(h).unwrap();
    let mut amplitudes = vec![Complex64::new(0.0, 0.0); start.amplitudes().len()];
    for k in 0..spectrum.dimension() {
        let v = spectrum.eigenvector(k).unwrap();
        let weight = v.inner(start).unwrap() * Complex64::from_polar(1.0, -spectrum.eigenvalues()[k] * t);
        for (a, b) in amplitudes.iter_mut().zip(v.amplitudes()) {
            *a += weight * b;
        }
    }
    Statevector::from_amplitudes(amplitudes).unwrap()
}

#[test]
fn qrte_follows_single_qubit_precession() {
    let h = PauliOperator::from_list(&[("X", 0.7), ("Z", 0.3)]).unwrap();
    let problem = TimeEvolutionProblem::new(h.clone(), 1.0).unwrap();
    let ansatz = single_qubit(vec![RotationBlock::Ry, RotationBlock::Rz]);
    let start = ansatz
        .product_state_parameters(&StateLabel::new("+").unwrap())
        .unwrap();
    let qrte = VarQrte::new(ansatz.clone());
    let result = qrte.evolve(&problem, &start).unwrap();

    for pair in result.energies.windows(2) {
        assert!((pair[1] - pair[0]).abs() < 1e-6);
    }
    let evolved = ansatz.state(result.final_parameters().unwrap()).unwrap();
    let exact = exact_evolution(&h, &Statevector::from_label("+").unwrap(), 1.0);
    assert!((evolved.fidelity(&exact).unwrap() - 1.0).abs() < 1e-6);
}
