//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use uuid::Uuid;

use qmetts_evolve::Ansatz;
use qmetts_sim::{LmgModel, PauliOperator, Spectrum};

use crate::config::ExperimentConfig;

/// Model, Hamiltonian and observable of a configuration.
pub struct Problem {
    pub model: LmgModel,
    pub hamiltonian: PauliOperator,
    pub observable: PauliOperator,
    pub observable_name: String,
}

impl Problem {
    /// Build everything the configuration describes.
    pub fn from_config(config: &ExperimentConfig) -> Result<Self> {
        let model = config.model.model()?;
        let hamiltonian = model.hamiltonian()?;
        let observable = config.qmetts.observable.build(&model)?;
        if observable.num_qubits() != hamiltonian.num_qubits() {
            anyhow::bail!(
                "Observable acts on {} qubits but the model has {}",
                observable.num_qubits(),
                hamiltonian.num_qubits()
            );
        }
        Ok(Self {
            model,
            hamiltonian,
            observable,
            observable_name: config.qmetts.observable.label(),
        })
    }

    /// Exact spectrum of the Hamiltonian.
    pub fn spectrum(&self) -> Result<Spectrum> {
        Spectrum::of(&self.hamiltonian).context("Exact diagonalisation failed")
    }

    /// Exact `⟨O⟩_β`.
    pub fn exact_average(&self, spectrum: &Spectrum, beta: f64) -> Result<f64> {
        Ok(spectrum.thermal_average(&self.observable.to_matrix(), beta)?)
    }
}

/// Build the configured ansatz for the model width.
pub fn build_ansatz(config: &ExperimentConfig) -> Result<Box<dyn Ansatz>> {
    config
        .ansatz
        .build(config.model.n as usize)
        .context("Failed to build ansatz")
}

/// JSON envelope written by `--output`.
#[derive(Debug, Serialize)]
pub struct Report<'a, T: Serialize> {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub command: &'a str,
    pub config: &'a ExperimentConfig,
    pub results: T,
}

impl<'a, T: Serialize> Report<'a, T> {
    pub fn new(
        command: &'a str,
        config: &'a ExperimentConfig,
        started_at: DateTime<Utc>,
        results: T,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            command,
            config,
            results,
        }
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        println!(
            "{} Report written to {}",
            style("✓").green().bold(),
            style(path.display()).green()
        );
        Ok(())
    }
}

/// Write `results` to `output` if one was given.
pub fn write_report<T: Serialize>(
    output: Option<&Path>,
    command: &str,
    config: &ExperimentConfig,
    started_at: DateTime<Utc>,
    results: T,
) -> Result<()> {
    match output {
        Some(path) => Report::new(command, config, started_at, results).write(path),
        None => Ok(()),
    }
}

/// Spinner for a single long step.
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress bar over `len` items.
pub fn progress_bar(len: u64, msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(msg.into());
    pb
}

/// Banner for a command.
pub fn print_header(title: &str) {
    let line = "═".repeat(60);
    println!("{}", style(&line).cyan());
    println!("  {}", style(title).cyan().bold());
    println!("{}", style(&line).cyan());
}

/// Section title.
pub fn print_section(title: &str) {
    println!();
    println!("{} {}", style("▶").green().bold(), style(title).bold());
    println!("{}", style("─".repeat(60)).dim());
}

/// `label: value` line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {:<24} {}", style(format!("{label}:")).dim(), value);
}

/// One-line summary of the configured model.
pub fn print_model(config: &ExperimentConfig) {
    print_result("Spins", config.model.n);
    print_result("γ_y", config.model.gy);
    print_result("B", config.model.b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObservableConfig;

    #[test]
    fn test_problem_from_default_config() {
        let config = ExperimentConfig::default();
        let problem = Problem::from_config(&config).unwrap();
        assert_eq!(problem.hamiltonian.num_qubits(), 2);
        assert_eq!(problem.observable_name, "m_z");
    }

    #[test]
    fn test_problem_rejects_wrong_width_observable() {
        let mut config = ExperimentConfig::default();
        config.qmetts.observable = ObservableConfig::Pauli {
            terms: vec![("ZZZ".into(), 1.0)],
        };
        assert!(Problem::from_config(&config).is_err());
    }

    #[test]
    fn test_exact_average_at_zero_beta() {
        let config = ExperimentConfig::default();
        let problem = Problem::from_config(&config).unwrap();
        let spectrum = problem.spectrum().unwrap();
        let m = problem.exact_average(&spectrum, 0.0).unwrap();
        assert!(m.abs() < 1e-12);
    }

    #[test]
    fn test_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let config = ExperimentConfig::default();
        write_report(Some(&path), "exact", &config, Utc::now(), vec![1.0, 2.0]).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["command"], "exact");
        assert_eq!(json["results"][1], 2.0);
        assert_eq!(json["config"]["model"]["n"], 2);
        assert!(json["run_id"].is_string());
    }
}
