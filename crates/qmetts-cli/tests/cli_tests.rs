//! End-to-end tests of the `qmetts` binary.
//!
//! Every run uses a tiny two-spin configuration written to a temporary
//! directory and checks the exit status and the JSON report.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const SMALL_CONFIG: &str = r#"
model: { n: 2, gy: 0.0, b: 0.5 }
ansatz: { kind: two_local, reps: 1 }
evolution: { step_size: 0.05 }
qmetts:
  final_beta: 1.0
  num_beta_points: 3
  shots: 20
  observable: { kind: magnetization, axis: z }
mhets:
  betas: [0.5, 1.0]
  maxiter: 200
seed: 11
"#;

fn write_config(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, text).unwrap();
    path
}

fn run(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qmetts"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .unwrap()
}

fn read_report(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_prints_effective_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), SMALL_CONFIG);
    let out = run(&config, &["config"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("shots: 20"));
    assert!(stdout.contains("seed: 11"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "model: { n: 0 }\n");
    let out = run(&config, &["exact"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Error:"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&dir.path().join("absent.yaml"), &["exact"]);
    assert!(!out.status.success());
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn test_exact_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), SMALL_CONFIG);
    let report = dir.path().join("exact.json");
    let out = run(&config, &["exact", "--output", report.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let json = read_report(&report);
    assert_eq!(json["command"], "exact");
    assert!(json["run_id"].is_string());
    assert_eq!(json["results"]["eigenvalues"].as_array().unwrap().len(), 4);
    let rows = json["results"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!((rows[0]["beta"].as_f64().unwrap() - 0.01).abs() < 1e-12);
}

#[test]
fn test_evolve_lowers_energy() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), SMALL_CONFIG);
    let report = dir.path().join("evolve.json");
    let out = run(
        &config,
        &[
            "evolve",
            "--initial-state",
            "++",
            "--time",
            "0.5",
            "--output",
            report.to_str().unwrap(),
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let json = read_report(&report);
    let energies = json["results"]["energies"].as_array().unwrap();
    assert_eq!(energies.len(), 11);
    let first = energies[0].as_f64().unwrap();
    let last = energies[10].as_f64().unwrap();
    assert!(last <= first + 1e-9);
}

#[test]
fn test_evolve_rejects_wrong_width_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), SMALL_CONFIG);
    let out = run(&config, &["evolve", "--initial-state", "000"]);
    assert!(!out.status.success());
}

#[test]
fn test_qmetts_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), SMALL_CONFIG);
    let report = dir.path().join("qmetts.json");
    let out = run(
        &config,
        &["qmetts", "--shots", "10", "--output", report.to_str().unwrap()],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let json = read_report(&report);
    assert_eq!(json["config"]["qmetts"]["shots"], 10);
    let chains = json["results"]["results"]["chains"].as_array().unwrap();
    assert_eq!(chains.len(), 3);
    for chain in chains {
        assert_eq!(chain["state_list"].as_array().unwrap().len(), 11);
    }
    assert_eq!(json["results"]["exact"].as_array().unwrap().len(), 3);
}

#[test]
fn test_mhets_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), SMALL_CONFIG);
    let report = dir.path().join("mhets.json");
    let out = run(&config, &["mhets", "--output", report.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let json = read_report(&report);
    let points = json["results"]["best"]["points"].as_array().unwrap();
    let exact = json["results"]["exact"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    for (point, reference) in points.iter().zip(exact) {
        let f = point["free_energy"].as_f64().unwrap();
        let bound = reference["free_energy"].as_f64().unwrap();
        assert!(f >= bound - 1e-6, "F = {f} below −ln Z = {bound}");
    }
    assert!(json["results"]["starts"].as_array().unwrap().is_empty());
}
