//! Tests for exact diagonalization and Gibbs-state references.

use qmetts_sim::{LmgModel, PauliOp, Spectrum, relative_entropy, von_neumann_entropy};

// ---------------------------------------------------------------------------
// Thermal quantities
// ---------------------------------------------------------------------------

#[test]
fn two_spin_thermal_energy_closed_form() {
    let spectrum = LmgModel::new(2, 0.0, 0.0).unwrap().spectrum().unwrap();
    for beta in [0.1, 0.5, 1.0, 3.0] {
        let e = spectrum.thermal_energy(beta).unwrap();
        assert!((e + 0.5 * (beta / 2.0).tanh()).abs() < 1e-10, "beta = {beta}");
    }
}

#[test]
fn thermal_energy_decreases_with_beta() {
    let spectrum = LmgModel::new(4, 0.5, 0.8).unwrap().spectrum().unwrap();
    let mut previous = f64::INFINITY;
    for beta in [0.0, 0.5, 1.0, 2.0, 4.0] {
        let e = spectrum.thermal_energy(beta).unwrap();
        assert!(e <= previous + 1e-12);
        previous = e;
    }
    assert!(previous >= spectrum.ground_energy());
}

#[test]
fn large_beta_approaches_ground_energy() {
    let spectrum = LmgModel::new(3, 0.0, 1.0).unwrap().spectrum().unwrap();
    let e = spectrum.thermal_energy(200.0).unwrap();
    assert!((e - spectrum.ground_energy()).abs() < 1e-6);
}

#[test]
fn gibbs_state_entropy_matches_weights() {
    let spectrum = LmgModel::new(3, 0.3, 0.6).unwrap().spectrum().unwrap();
    let rho = spectrum.thermal_state(0.9).unwrap();
    let s = von_neumann_entropy(&rho).unwrap();
    assert!((s - spectrum.entropy(0.9).unwrap()).abs() < 1e-8);
}

#[test]
fn thermal_magnetization_from_dense_average() {
    let model = LmgModel::new(3, 0.0, 1.0).unwrap();
    let spectrum = model.spectrum().unwrap();
    let mz = model.magnetization(PauliOp::Z).unwrap().to_matrix();
    let high_t = spectrum.thermal_average(&mz, 0.0).unwrap();
    let low_t = spectrum.thermal_average(&mz, 50.0).unwrap();
    assert!(high_t.abs() < 1e-10);
    assert!(low_t > 0.5);
}

// ---------------------------------------------------------------------------
// Eigenvectors
// ---------------------------------------------------------------------------

#[test]
fn eigenvectors_are_eigenstates() {
    let h = LmgModel::new(3, 0.5, 0.4).unwrap().hamiltonian().unwrap();
    let spectrum = Spectrum::of(&h).unwrap();
    for k in 0..spectrum.dimension() {
        let v = spectrum.eigenvector(k).unwrap();
        let e = h.expectation(&v).unwrap();
        assert!((e - spectrum.eigenvalues()[k]).abs() < 1e-8);
    }
    assert!(spectrum.eigenvector(spectrum.dimension()).is_none());
}

#[test]
fn relative_entropy_is_non_negative() {
    let spectrum = LmgModel::new(2, 0.2, 0.5).unwrap().spectrum().unwrap();
    let a = spectrum.thermal_state(0.5).unwrap();
    let b = spectrum.thermal_state(2.0).unwrap();
    assert!(relative_entropy(&a, &b).unwrap() >= -1e-12);
}
