//! Tests for MHETS free-energy minimisation.

use qmetts_evolve::{Ansatz, TwoLocal, TwoLocalConfig};
use qmetts_sim::{LmgModel, StateLabel};
use qmetts_thermal::{Mhets, MhetsConfig, OptimizerKind, ThermalError};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn two_local(n: usize, par_name: &str) -> Box<TwoLocal> {
    Box::new(
        TwoLocal::new(
            n,
            TwoLocalConfig {
                par_name: par_name.to_string(),
                ..TwoLocalConfig::default()
            },
        )
        .unwrap(),
    )
}

fn mhets(n: u32, b: f64, config: MhetsConfig) -> Mhets {
    let h = LmgModel::new(n, 0.0, b).unwrap().hamiltonian().unwrap();
    Mhets::new(h, two_local(n as usize, "x"), two_local(n as usize, "x"), config).unwrap()
}

fn single_spin() -> Mhets {
    mhets(
        1,
        1.0,
        MhetsConfig::default().with_optimizer(OptimizerKind::Cobyla, 1000, 1e-8),
    )
}

// ---------------------------------------------------------------------------
// Circuit assembly
// ---------------------------------------------------------------------------

#[test]
fn shared_prefix_is_doubled() {
    let m = mhets(2, 0.5, MhetsConfig::default());
    assert_eq!(m.system_par_name(), "xx");
    assert_eq!(m.num_parameters(), 8);
    assert_eq!(m.num_ancilla_parameters(), 4);
    assert_eq!(m.parameter_names()[0], "x_0");
    assert_eq!(m.parameter_names()[4], "xx_0");
    assert_eq!(m.total_circuit().num_qubits(), 4);
    assert_eq!(m.total_circuit().num_parameters(), 8);
}

#[test]
fn distinct_prefixes_are_kept() {
    let h = LmgModel::new(2, 0.0, 0.5).unwrap().hamiltonian().unwrap();
    let m = Mhets::new(h, two_local(2, "a"), two_local(2, "s"), MhetsConfig::default()).unwrap();
    assert_eq!(m.system_par_name(), "s");
    assert_eq!(m.parameter_names()[4], "s_0");
}

#[test]
fn widths_must_match_hamiltonian() {
    let h = LmgModel::new(2, 0.0, 0.5).unwrap().hamiltonian().unwrap();
    let err = Mhets::new(h, two_local(1, "a"), two_local(2, "s"), MhetsConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ThermalError::WidthMismatch { what: "ancilla ansatz", expected: 2, got: 1 }
    ));
}

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

#[test]
fn cost_of_all_zero_parameters() {
    // |00⟩ on the system: no entropy, energy −B·N.
    let m = mhets(2, 0.5, MhetsConfig::default());
    let zeros = vec![0.0; m.num_parameters()];
    let (energy, entropy) = m.cost_terms(&zeros).unwrap();
    assert!((energy + 1.0).abs() < 1e-12);
    assert!(entropy.abs() < 1e-12);
    assert!((m.cost(2.0, &zeros).unwrap() + 2.0).abs() < 1e-12);
}

#[test]
fn cost_of_maximally_mixed_system() {
    let m = mhets(2, 0.5, MhetsConfig::default());
    let ancilla = two_local(2, "x")
        .product_state_parameters(&StateLabel::new("++").unwrap())
        .unwrap();
    let mut theta = ancilla;
    theta.extend(vec![0.0; m.num_parameters() - m.num_ancilla_parameters()]);

    let (energy, entropy) = m.cost_terms(&theta).unwrap();
    assert!(energy.abs() < 1e-12);
    assert!((entropy - 2.0 * 2f64.ln()).abs() < 1e-12);
    assert!((m.cost(1.3, &theta).unwrap() + 2.0 * 2f64.ln()).abs() < 1e-12);

    let rho = m.reduced_system_state(&theta).unwrap();
    for i in 0..4 {
        for j in 0..4 {
            let want = if i == j { 0.25 } else { 0.0 };
            assert!((rho[(i, j)].re - want).abs() < 1e-12);
            assert!(rho[(i, j)].im.abs() < 1e-12);
        }
    }
}

#[test]
fn cost_rejects_wrong_length() {
    let m = mhets(2, 0.5, MhetsConfig::default());
    assert!(matches!(
        m.cost(1.0, &[0.0; 3]),
        Err(ThermalError::ParameterCountMismatch { expected: 8, got: 3 })
    ));
}

// ---------------------------------------------------------------------------
// Optimisation
// ---------------------------------------------------------------------------

#[test]
fn optimum_approaches_minus_log_partition_function() {
    let m = single_spin();
    let beta = 1.0;
    let exact = -(2.0 * f64::cosh(beta)).ln();
    let point = m.optimize(beta, None).unwrap();

    assert!(point.free_energy < -1.1, "F = {}", point.free_energy);
    // Variational bound
    assert!(point.free_energy >= exact - 1e-9);
    assert!((point.free_energy - (beta * point.energy - point.entropy)).abs() < 1e-12);
    assert!(point.free_energy <= point.history[0]);
}

#[test]
fn warm_start_chains_betas() {
    let m = single_spin();
    let run = m.multi_beta_from_scratch(&[0.5, 1.0]).unwrap();
    assert_eq!(run.betas(), vec![0.5, 1.0]);
    assert_eq!(run.points[0].starting_point, vec![0.0; 4]);
    assert_eq!(run.points[1].starting_point, run.points[0].parameters);
}

#[test]
fn stored_betas_are_reused() {
    let m = single_spin();
    let old = m.multi_beta_from_scratch(&[0.5, 1.0]).unwrap();
    let new = m.multi_beta_from_data(&[0.5, 0.75, 1.0], &old).unwrap();

    assert_eq!(new.betas(), vec![0.5, 0.75, 1.0]);
    assert_eq!(new.points[0].parameters, old.points[0].parameters);
    assert_eq!(new.points[2].parameters, old.points[1].parameters);
    assert_eq!(new.points[1].starting_point, old.points[0].parameters);
}

#[test]
fn multi_start_keeps_the_lowest() {
    let m = single_spin();
    let mut rng = StdRng::seed_from_u64(9);
    let result = m.multi_start(0.8, 3, &mut rng).unwrap();

    assert_eq!(result.runs.len(), 3);
    assert_eq!(result.runs[0].starting_point, vec![0.0; 4]);
    for run in &result.runs[1..] {
        assert!(run.starting_point.iter().all(|v| v.abs() <= std::f64::consts::PI));
    }
    let lowest = result
        .runs
        .iter()
        .map(|r| r.free_energy)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(result.best.free_energy, lowest);
}

#[test]
fn multi_beta_multi_start_shapes() {
    let m = mhets(
        1,
        1.0,
        MhetsConfig::default()
            .with_optimizer(OptimizerKind::Cobyla, 200, 1e-6)
            .with_starting_points(2),
    );
    let mut rng = StdRng::seed_from_u64(1);
    let (best, per_start) = m.multi_beta_multi_start(&[0.5, 1.0], &mut rng).unwrap();
    assert_eq!(best.len(), 2);
    assert_eq!(per_start.len(), 2);
    assert!(per_start.iter().all(|r| r.betas() == vec![0.5, 1.0]));
}
