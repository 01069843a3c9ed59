//! QMETTS command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use console::style;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use qmetts_evolve::VarQite;
use qmetts_thermal::{QmettsInstance, QmettsResults};

use super::common::{
    Problem, build_ansatz, print_header, print_model, print_result, print_section, progress_bar,
    spinner, write_report,
};
use crate::config::ExperimentConfig;

#[derive(Debug, Serialize)]
struct QmettsReport<'a> {
    observable: &'a str,
    exact: Vec<f64>,
    results: &'a QmettsResults,
}

/// Execute the qmetts command.
pub fn execute(
    mut config: ExperimentConfig,
    shots: Option<usize>,
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let started_at = Utc::now();
    if let Some(shots) = shots {
        config.qmetts.sampling.shots = shots;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }

    print_header("QMETTS");
    print_model(&config);

    let problem = Problem::from_config(&config)?;
    let ansatz = build_ansatz(&config)?;
    print_result(
        "Ansatz",
        format!("{} ({} parameters)", ansatz.name(), ansatz.num_parameters()),
    );

    let evolver = VarQite::new(ansatz).with_config(config.evolution.clone());
    let instance = QmettsInstance::new(
        problem.hamiltonian.clone(),
        evolver,
        config.qmetts.sampling.clone(),
    )?;
    print_result("Basis states", instance.basis_list().len());
    print_result("Measurement bases", instance.basis_measure_list().len());
    print_result("Initial state", instance.initial_state());
    print_result("Shots per β", config.qmetts.sampling.shots);
    print_result("Seed", config.seed);

    // Evolve every basis state once to β_max / 2
    print_section("Imaginary-time evolution");
    let pb = progress_bar(instance.basis_list().len() as u64, "basis states");
    let preparation = instance.prepare_with(|_, label| {
        pb.set_message(format!("evolved |{label}⟩"));
        pb.inc(1);
    });
    pb.finish_with_message("done");
    let preparation = preparation?;

    let pb = spinner("Sampling METTS chains...");
    let mut rng = StdRng::seed_from_u64(config.seed);
    let results = instance.multi_beta_qmetts(preparation, &problem.observable, &mut rng);
    pb.finish_and_clear();
    let results = results?;

    let spectrum = problem.spectrum()?;
    let exact = results
        .beta_list()
        .into_iter()
        .map(|beta| problem.exact_average(&spectrum, beta))
        .collect::<Result<Vec<_>>>()?;

    print_section("Thermal averages");
    let name = format!("⟨{}⟩", problem.observable_name);
    println!(
        "  {:>8} {:>14} {:>12} {:>14} {:>10}",
        "β", name, "± err", "exact", "states"
    );
    let histograms = results.state_histograms();
    for (i, chain) in results.chains.iter().enumerate() {
        let distinct = histograms.get(i).map_or(0, BTreeMap::len);
        println!(
            "  {:>8.4} {:>14.8} {:>12.2e} {:>14.8} {:>10}",
            chain.beta,
            chain.thermal_average,
            chain.standard_error(),
            exact[i],
            distinct
        );
    }

    let worst = results
        .thermal_averages()
        .iter()
        .zip(&exact)
        .map(|(a, e)| (a - e).abs())
        .fold(0.0_f64, f64::max);
    println!();
    println!(
        "{} Largest deviation from exact: {}",
        style("✓").green().bold(),
        style(format!("{worst:.4e}")).yellow()
    );

    write_report(
        output,
        "qmetts",
        &config,
        started_at,
        QmettsReport {
            observable: &problem.observable_name,
            exact,
            results: &results,
        },
    )
}
