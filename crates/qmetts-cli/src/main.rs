//! QMETTS Command-Line Interface
//!
//! Thermal states of the Lipkin-Meshkov-Glick model from variational
//! imaginary-time evolution (QMETTS) and free-energy minimisation (MHETS).
//!
//! ```text
//! qmetts exact                 exact spectrum and thermal curve
//! qmetts evolve --time 1.0     VarQITE (or --real VarQRTE) of one product state
//! qmetts qmetts --shots 200    sample METTS chains over the β grid
//! qmetts mhets                 minimise F(θ) on the configured βs
//! qmetts config                print the effective configuration
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{exact, evolve, mhets, qmetts};
use config::ExperimentConfig;

/// QMETTS - thermal-state sampling with variational quantum time evolution
#[derive(Parser)]
#[command(name = "qmetts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exact spectrum and thermal averages of the configured model
    Exact {
        /// Write a JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evolve one product state with VarQITE or VarQRTE
    Evolve {
        /// Starting product state, e.g. "0+" (defaults to all zeros)
        #[arg(short, long)]
        initial_state: Option<String>,

        /// Final (imaginary) time
        #[arg(short, long, default_value = "1.0")]
        time: f64,

        /// Real-time evolution instead of imaginary-time
        #[arg(long)]
        real: bool,

        /// Write a JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sample QMETTS chains over the β grid
    Qmetts {
        /// Chain length (overrides the configuration)
        #[arg(short, long)]
        shots: Option<usize>,

        /// RNG seed (overrides the configuration)
        #[arg(long)]
        seed: Option<u64>,

        /// Write a JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Minimise the Helmholtz free energy of the purification ansatz
    Mhets {
        /// RNG seed for random starts (overrides the configuration)
        #[arg(long)]
        seed: Option<u64>,

        /// Write a JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as YAML
    Config,
}

fn main() {
    let cli = Cli::parse();

    let config = match ExperimentConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // -v flags win over the configured level
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Exact { output } => exact::execute(&config, output.as_deref()),
        Commands::Evolve {
            initial_state,
            time,
            real,
            output,
        } => evolve::execute(
            &config,
            initial_state.as_deref(),
            time,
            real,
            output.as_deref(),
        ),
        Commands::Qmetts {
            shots,
            seed,
            output,
        } => qmetts::execute(config, shots, seed, output.as_deref()),
        Commands::Mhets { seed, output } => mhets::execute(config, seed, output.as_deref()),
        Commands::Config => print_config(&config),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn print_config(config: &ExperimentConfig) -> anyhow::Result<()> {
    print!("{}", serde_yaml_ng::to_string(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qmetts_overrides() {
        let cli = Cli::try_parse_from(["qmetts", "-vv", "qmetts", "--shots", "7", "--seed", "3"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Qmetts { shots, seed, .. } => {
                assert_eq!(shots, Some(7));
                assert_eq!(seed, Some(3));
            }
            _ => panic!("expected qmetts"),
        }
    }

    #[test]
    fn test_parse_evolve_defaults() {
        let cli = Cli::try_parse_from(["qmetts", "evolve", "--real"]).unwrap();
        match cli.command {
            Commands::Evolve {
                initial_state,
                time,
                real,
                output,
            } => {
                assert!(initial_state.is_none());
                assert_eq!(time, 1.0);
                assert!(real);
                assert!(output.is_none());
            }
            _ => panic!("expected evolve"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["qmetts", "exact", "--config", "run.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("run.yaml")));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["qmetts", "anneal"]).is_err());
    }
}
