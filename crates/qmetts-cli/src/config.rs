//! Experiment configuration.
//!
//! Loaded from YAML, then overridden by `QMETTS_*` environment variables.
//!
//! Precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file (`--config`, or `<config dir>/qmetts/config.yaml`)
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use qmetts_evolve::{AnsatzConfig, EvolverConfig};
use qmetts_sim::{LabelFlag, LmgModel, PauliOp, PauliOperator, SimResult, StateLabel};
use qmetts_thermal::{MhetsConfig, OptimizerKind, QmettsConfig};

/// Largest system the dense simulator is allowed to run.
pub const MAX_QUBITS: u32 = 10;

/// Full configuration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// LMG parameters.
    #[serde(default)]
    pub model: ModelConfig,

    /// Ansatz family and layout.
    #[serde(default)]
    pub ansatz: AnsatzConfig,

    /// VarQITE / VarQRTE settings.
    #[serde(default)]
    pub evolution: EvolverConfig,

    /// QMETTS sampling.
    #[serde(default)]
    pub qmetts: QmettsSection,

    /// MHETS optimisation.
    #[serde(default)]
    pub mhets: MhetsSection,

    /// Seed for chain sampling and random starts.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_seed() -> u64 {
    42
}

fn default_n() -> u32 {
    2
}

fn default_gy() -> f64 {
    0.5
}

fn default_b() -> f64 {
    0.5
}

fn default_axis() -> String {
    "z".into()
}

fn default_betas() -> Vec<f64> {
    vec![0.5, 1.0, 2.0]
}

fn default_log_level() -> String {
    "warn".into()
}

/// LMG model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of spins.
    #[serde(default = "default_n")]
    pub n: u32,
    /// YY anisotropy.
    #[serde(default = "default_gy")]
    pub gy: f64,
    /// Field strength.
    #[serde(default = "default_b")]
    pub b: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n: default_n(),
            gy: default_gy(),
            b: default_b(),
        }
    }
}

impl ModelConfig {
    /// The model these parameters describe.
    pub fn model(&self) -> SimResult<LmgModel> {
        LmgModel::new(self.n, self.gy, self.b)
    }
}

/// Observable whose thermal average is sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservableConfig {
    /// `(1/N) Σ_i P_i` along `axis` (`x`, `y` or `z`).
    Magnetization {
        /// Axis.
        #[serde(default = "default_axis")]
        axis: String,
    },
    /// The Hamiltonian itself.
    Energy,
    /// Explicit `(dense label, coefficient)` terms.
    Pauli {
        /// Terms.
        terms: Vec<(String, f64)>,
    },
}

impl Default for ObservableConfig {
    fn default() -> Self {
        Self::Magnetization {
            axis: default_axis(),
        }
    }
}

impl ObservableConfig {
    /// Build the operator for `model`.
    pub fn build(&self, model: &LmgModel) -> anyhow::Result<PauliOperator> {
        Ok(match self {
            Self::Magnetization { axis } => model.magnetization(parse_axis(axis)?)?,
            Self::Energy => model.hamiltonian()?,
            Self::Pauli { terms } => PauliOperator::from_list(terms)?,
        })
    }

    /// Short name for tables.
    pub fn label(&self) -> String {
        match self {
            Self::Magnetization { axis } => format!("m_{}", axis.to_lowercase()),
            Self::Energy => "H".into(),
            Self::Pauli { .. } => "O".into(),
        }
    }
}

fn parse_axis(axis: &str) -> anyhow::Result<PauliOp> {
    match axis.to_ascii_lowercase().as_str() {
        "x" => Ok(PauliOp::X),
        "y" => Ok(PauliOp::Y),
        "z" => Ok(PauliOp::Z),
        other => anyhow::bail!("Unknown magnetization axis '{other}' (expected x, y or z)"),
    }
}

/// QMETTS sampling plus the observable to average.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QmettsSection {
    /// Grid, chain and basis settings.
    #[serde(flatten)]
    pub sampling: QmettsConfig,
    /// Averaged observable.
    #[serde(default)]
    pub observable: ObservableConfig,
}

/// MHETS optimiser settings plus the β grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MhetsSection {
    /// Optimizer settings.
    #[serde(flatten)]
    pub optimization: MhetsConfig,
    /// Inverse temperatures to solve, in order.
    #[serde(default = "default_betas")]
    pub betas: Vec<f64>,
}

impl Default for MhetsSection {
    fn default() -> Self {
        Self {
            optimization: MhetsConfig::default(),
            betas: default_betas(),
        }
    }
}

/// Log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when no `-v` flag is given.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("{key}: cannot parse '{value}'")))
}

impl ExperimentConfig {
    /// Default file location, `<config dir>/qmetts/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("qmetts").join("config.yaml"))
    }

    /// Parse YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// File (explicit, else default location if present), then environment,
    /// then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(p) => Self::from_file(p)?,
                None => Self::default(),
            },
        };
        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QMETTS_*` variables from the process environment.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; absent keys leave fields unchanged.
    pub fn merge_env_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Model
        if let Some(v) = lookup("QMETTS_N") {
            self.model.n = parse_env("QMETTS_N", &v)?;
        }
        if let Some(v) = lookup("QMETTS_GY") {
            self.model.gy = parse_env("QMETTS_GY", &v)?;
        }
        if let Some(v) = lookup("QMETTS_B") {
            self.model.b = parse_env("QMETTS_B", &v)?;
        }

        // Ansatz
        if let Some(v) = lookup("QMETTS_REPS") {
            let reps = parse_env("QMETTS_REPS", &v)?;
            match &mut self.ansatz {
                AnsatzConfig::TwoLocal(c) => c.reps = reps,
                AnsatzConfig::Pma(c) => c.reps = reps,
            }
        }

        // Evolution
        if let Some(v) = lookup("QMETTS_STEP_SIZE") {
            self.evolution.step_size = parse_env("QMETTS_STEP_SIZE", &v)?;
        }
        if let Some(v) = lookup("QMETTS_NUM_TIMESTEPS") {
            self.evolution.num_timesteps = Some(parse_env("QMETTS_NUM_TIMESTEPS", &v)?);
        }

        // QMETTS
        let sampling = &mut self.qmetts.sampling;
        if let Some(v) = lookup("QMETTS_FINAL_BETA") {
            sampling.final_beta = parse_env("QMETTS_FINAL_BETA", &v)?;
        }
        if let Some(v) = lookup("QMETTS_NUM_BETA_POINTS") {
            sampling.num_beta_points = parse_env("QMETTS_NUM_BETA_POINTS", &v)?;
        }
        if let Some(v) = lookup("QMETTS_SHOTS") {
            sampling.shots = parse_env("QMETTS_SHOTS", &v)?;
        }
        if let Some(v) = lookup("QMETTS_INITIAL_STATE") {
            let label: StateLabel = parse_env("QMETTS_INITIAL_STATE", &v)?;
            sampling.initial_state = Some(label);
        }
        if let Some(v) = lookup("QMETTS_OPERATORS") {
            sampling.operators = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = lookup("QMETTS_FLAG") {
            let flag: LabelFlag = parse_env("QMETTS_FLAG", &v)?;
            sampling.flag = flag;
        }

        // MHETS
        if let Some(v) = lookup("QMETTS_OPTIMIZER") {
            let kind: OptimizerKind = parse_env("QMETTS_OPTIMIZER", &v)?;
            self.mhets.optimization.optimizer = kind;
        }
        if let Some(v) = lookup("QMETTS_MAXITER") {
            self.mhets.optimization.maxiter = parse_env("QMETTS_MAXITER", &v)?;
        }

        // Misc
        if let Some(v) = lookup("QMETTS_SEED") {
            self.seed = parse_env("QMETTS_SEED", &v)?;
        }
        if let Some(v) = lookup("QMETTS_LOG_LEVEL") {
            self.logging.level = v;
        }

        Ok(self)
    }

    /// Reject settings that cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.model.n == 0 || self.model.n > MAX_QUBITS {
            return invalid(format!(
                "model.n must be between 1 and {MAX_QUBITS}, got {}",
                self.model.n
            ));
        }
        if !(self.model.gy.is_finite() && self.model.b.is_finite()) {
            return invalid("model.gy and model.b must be finite".into());
        }

        if let AnsatzConfig::Pma(_) = self.ansatz {
            if self.model.n < 2 {
                return invalid("the pma ansatz needs at least two spins".into());
            }
        }

        let evolution = &self.evolution;
        if !(evolution.step_size.is_finite() && evolution.step_size > 0.0) {
            return invalid(format!(
                "evolution.step_size must be positive, got {}",
                evolution.step_size
            ));
        }
        if evolution.num_timesteps == Some(0) {
            return invalid("evolution.num_timesteps must be at least 1".into());
        }
        if evolution.regularization < 0.0 || evolution.rcond < 0.0 {
            return invalid("evolution.regularization and rcond must be non-negative".into());
        }

        self.qmetts
            .sampling
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if let Some(label) = &self.qmetts.sampling.initial_state {
            if label.num_qubits() != self.model.n as usize {
                return invalid(format!(
                    "qmetts.initial_state '{label}' does not have {} characters",
                    self.model.n
                ));
            }
        }

        self.mhets
            .optimization
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if self.mhets.betas.is_empty() {
            return invalid("mhets.betas must not be empty".into());
        }
        if let Some(b) = self.mhets.betas.iter().find(|b| !(b.is_finite() && **b >= 0.0)) {
            return invalid(format!("mhets.betas contains invalid value {b}"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return invalid(format!("Invalid log level: {other}")),
        }

        Ok(())
    }
}
