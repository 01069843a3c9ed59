//! MHETS command implementation.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use console::style;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use qmetts_thermal::{Mhets, MhetsRun};

use super::common::{
    Problem, build_ansatz, print_header, print_model, print_result, print_section, spinner,
    write_report,
};
use super::exact::{ExactRow, exact_row};
use crate::config::ExperimentConfig;

#[derive(Debug, Serialize)]
struct MhetsReport<'a> {
    parameter_names: &'a [String],
    best: &'a MhetsRun,
    /// One run per starting point; empty for a single start.
    starts: Vec<MhetsRun>,
    exact: Vec<ExactRow>,
}

/// Execute the mhets command.
pub fn execute(
    mut config: ExperimentConfig,
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let started_at = Utc::now();
    if let Some(seed) = seed {
        config.seed = seed;
    }

    print_header("MHETS");
    print_model(&config);

    let problem = Problem::from_config(&config)?;
    let settings = &config.mhets.optimization;
    let mhets = Mhets::new(
        problem.hamiltonian.clone(),
        build_ansatz(&config)?,
        build_ansatz(&config)?,
        settings.clone(),
    )?;
    print_result("Total qubits", 2 * mhets.num_qubits());
    print_result(
        "Parameters",
        format!(
            "{} ({} ancilla)",
            mhets.num_parameters(),
            mhets.num_ancilla_parameters()
        ),
    );
    print_result("Optimizer", format!("{} (maxiter {})", settings.optimizer, settings.maxiter));
    print_result("Starting points", settings.n_starting_points);

    let betas = config.mhets.betas.clone();
    let pb = spinner(format!("Minimising F(θ) on {} temperatures...", betas.len()));
    let outcome = if settings.n_starting_points > 1 {
        let mut rng = StdRng::seed_from_u64(config.seed);
        mhets.multi_beta_multi_start(&betas, &mut rng)
    } else {
        mhets.multi_beta_from_scratch(&betas).map(|run| (run, Vec::new()))
    };
    pb.finish_and_clear();
    let (best, starts) = outcome?;

    let spectrum = problem.spectrum()?;
    let exact = betas
        .iter()
        .map(|&beta| exact_row(&problem, &spectrum, beta))
        .collect::<Result<Vec<_>>>()?;

    print_section("Free energy");
    println!(
        "  {:>8} {:>14} {:>14} {:>12} {:>12} {:>8}",
        "β", "F(θ*)", "−ln Z", "⟨H⟩", "S", "evals"
    );
    for (point, reference) in best.points.iter().zip(&exact) {
        println!(
            "  {:>8.4} {:>14.8} {:>14.8} {:>12.6} {:>12.6} {:>8}",
            point.beta,
            point.free_energy,
            reference.free_energy,
            point.energy,
            point.entropy,
            point.num_evaluations
        );
    }

    // F(θ) ≥ −ln Z for every θ, so the gap is the optimisation error
    let worst = best
        .points
        .iter()
        .zip(&exact)
        .map(|(p, e)| p.free_energy - e.free_energy)
        .fold(f64::NEG_INFINITY, f64::max);
    println!();
    println!(
        "{} Largest gap to exact free energy: {}",
        style("✓").green().bold(),
        style(format!("{worst:.4e}")).yellow()
    );

    write_report(
        output,
        "mhets",
        &config,
        started_at,
        MhetsReport {
            parameter_names: mhets.parameter_names(),
            best: &best,
            starts,
            exact,
        },
    )
}
