//! Exact command implementation.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use console::style;
use serde::Serialize;

use qmetts_sim::Spectrum;
use qmetts_thermal::{MIN_BETA, linspace};

use super::common::{Problem, print_header, print_model, print_result, print_section, write_report};
use crate::config::ExperimentConfig;

/// Reference values at one β.
#[derive(Debug, Clone, Serialize)]
pub struct ExactRow {
    pub beta: f64,
    pub energy: f64,
    pub observable: f64,
    pub entropy: f64,
    /// `−ln Z`.
    pub free_energy: f64,
}

#[derive(Debug, Serialize)]
struct ExactReport {
    eigenvalues: Vec<f64>,
    observable: String,
    rows: Vec<ExactRow>,
}

/// Execute the exact command.
pub fn execute(config: &ExperimentConfig, output: Option<&Path>) -> Result<()> {
    let started_at = Utc::now();
    print_header("Exact diagonalisation");
    print_model(config);

    let problem = Problem::from_config(config)?;
    print_result("Pauli terms", problem.model.pauli_labels().len());

    let spectrum = problem.spectrum()?;
    let eigenvalues = spectrum.eigenvalues().to_vec();

    print_section("Spectrum");
    print_result("Ground energy", format!("{:.8}", spectrum.ground_energy()));
    if let Some(gap) = eigenvalues.get(1).map(|e1| e1 - spectrum.ground_energy()) {
        print_result("Gap", format!("{gap:.8}"));
    }
    for (k, e) in eigenvalues.iter().take(8).enumerate() {
        println!("  E_{k:<3} {e:>14.8}");
    }
    if eigenvalues.len() > 8 {
        println!("  {}", style(format!("... {} more", eigenvalues.len() - 8)).dim());
    }

    let sampling = &config.qmetts.sampling;
    let rows = linspace(MIN_BETA, sampling.final_beta, sampling.num_beta_points)
        .into_iter()
        .map(|beta| exact_row(&problem, &spectrum, beta))
        .collect::<Result<Vec<_>>>()?;

    print_section("Thermal averages");
    println!(
        "  {:>8} {:>14} {:>14} {:>14} {:>14}",
        "β",
        "⟨H⟩",
        format!("⟨{}⟩", problem.observable_name),
        "S",
        "−ln Z"
    );
    for row in &rows {
        println!(
            "  {:>8.4} {:>14.8} {:>14.8} {:>14.8} {:>14.8}",
            row.beta, row.energy, row.observable, row.entropy, row.free_energy
        );
    }

    write_report(
        output,
        "exact",
        config,
        started_at,
        ExactReport {
            eigenvalues,
            observable: problem.observable_name.clone(),
            rows,
        },
    )
}

/// Exact values for one β.
pub fn exact_row(problem: &Problem, spectrum: &Spectrum, beta: f64) -> Result<ExactRow> {
    Ok(ExactRow {
        beta,
        energy: spectrum.thermal_energy(beta)?,
        observable: problem.exact_average(spectrum, beta)?,
        entropy: spectrum.entropy(beta)?,
        free_energy: spectrum.helmholtz_cost(beta)?,
    })
}
