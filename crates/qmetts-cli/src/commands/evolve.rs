//! Evolve command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;

use qmetts_evolve::{
    Ansatz, ImaginaryTimeEvolver, RealTimeEvolver, TimeEvolutionProblem, TimeEvolutionResult,
    VarQite, VarQrte,
};
use qmetts_sim::StateLabel;

use super::common::{
    Problem, build_ansatz, print_header, print_model, print_result, print_section, spinner,
    write_report,
};
use crate::config::ExperimentConfig;

/// Rows shown in the trajectory table.
const TABLE_ROWS: usize = 10;

/// Execute the evolve command.
pub fn execute(
    config: &ExperimentConfig,
    initial_state: Option<&str>,
    time: f64,
    real: bool,
    output: Option<&Path>,
) -> Result<()> {
    let started_at = Utc::now();
    let kind = if real { "VarQRTE" } else { "VarQITE" };
    print_header(&format!("{kind} of a product state"));
    print_model(config);

    let problem = Problem::from_config(config)?;
    let n = config.model.n as usize;
    let label = match initial_state {
        Some(s) => StateLabel::new(s).with_context(|| format!("Invalid initial state '{s}'"))?,
        None => StateLabel::new("0".repeat(n))?,
    };
    if label.num_qubits() != n {
        anyhow::bail!(
            "Initial state '{label}' has {} characters, the model has {n} spins",
            label.num_qubits()
        );
    }

    let ansatz = build_ansatz(config)?;
    let start = ansatz.product_state_parameters(&label)?;
    print_result("Ansatz", ansatz.name());
    print_result("Parameters", ansatz.num_parameters());
    print_result("Initial state", &label);
    print_result("Final time", time);

    let evolution_problem = TimeEvolutionProblem::new(problem.hamiltonian.clone(), time)?
        .with_aux_operator(problem.observable_name.clone(), problem.observable.clone());

    let pb = spinner(format!("Running {kind}..."));
    let result = if real {
        VarQrte::new(ansatz)
            .with_config(config.evolution.clone())
            .evolve(&evolution_problem, &start)
    } else {
        VarQite::new(ansatz)
            .with_config(config.evolution.clone())
            .evolve(&evolution_problem, &start)
    };
    pb.finish_and_clear();
    let result = result?;

    print_section("Trajectory");
    print_trajectory(&result, &problem.observable_name);

    if !result.ill_conditioned_steps.is_empty() {
        println!(
            "  {} {} ill-conditioned steps",
            style("!").yellow().bold(),
            result.ill_conditioned_steps.len()
        );
    }

    if !real {
        let spectrum = problem.spectrum()?;
        print_section("Reference");
        print_result("Ground energy", format!("{:.8}", spectrum.ground_energy()));
        if let Some(e) = result.energies.last() {
            let gap = e - spectrum.ground_energy();
            print_result("Energy above ground", format!("{gap:.3e}"));
        }
    }

    write_report(output, "evolve", config, started_at, &result)
}

fn print_trajectory(result: &TimeEvolutionResult, observable_name: &str) {
    println!(
        "  {:>10} {:>14} {:>14}",
        "t",
        "⟨H⟩",
        format!("⟨{observable_name}⟩")
    );
    let stride = (result.len() / TABLE_ROWS).max(1);
    let observable = result.observables.first();
    for i in (0..result.len()).filter(|i| i % stride == 0 || *i + 1 == result.len()) {
        let value = observable.and_then(|o| o.get(i)).copied().unwrap_or(f64::NAN);
        println!(
            "  {:>10.4} {:>14.8} {:>14.8}",
            result.times[i], result.energies[i], value
        );
    }
}
