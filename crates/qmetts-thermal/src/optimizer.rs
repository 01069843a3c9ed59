//! Derivative-free optimizers for variational cost functions.
//!
//! Both optimizers treat the objective as a black box returning `f64`; the
//! free-energy surface of MHETS has no cheap analytic gradient, and a
//! simplex or a stochastic two-point estimate is enough for the small
//! parameter counts involved.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A minimiser over `R^n`.
pub trait Optimizer {
    /// Minimise `objective` starting from `initial_params`.
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64;
}

/// Result of an optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best parameters found.
    pub optimal_params: Vec<f64>,
    /// Objective at `optimal_params`.
    pub optimal_value: f64,
    /// Number of objective evaluations.
    pub num_evaluations: usize,
    /// Number of iterations performed.
    pub num_iterations: usize,
    /// Best value after each iteration, starting with the initial point.
    pub history: Vec<f64>,
    /// Whether the stopping tolerance was met before `maxiter`.
    pub converged: bool,
}

/// NaN sorts last so a failed evaluation never wins.
fn cmp_value(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// Smallest non-NaN entry, or NaN if there is none.
fn lowest(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .min_by(|a, b| cmp_value(*a, *b))
        .unwrap_or(f64::NAN)
}

/// Counts evaluations around a user objective.
struct Counted<F> {
    objective: F,
    calls: usize,
}

impl<F: FnMut(&[f64]) -> f64> Counted<F> {
    fn new(objective: F) -> Self {
        Self {
            objective,
            calls: 0,
        }
    }

    fn eval(&mut self, x: &[f64]) -> f64 {
        self.calls += 1;
        (self.objective)(x)
    }
}

/// Trust-region-bounded simplex search in the spirit of COBYLA.
///
/// Every trial step is clipped to the current radius `rho`. When the simplex
/// values agree to within `tol` the radius is halved and the simplex rebuilt
/// around the best vertex; the run converges once that happens at `rhoend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cobyla {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Spread of simplex values treated as flat.
    pub tol: f64,
    /// Initial trust-region radius.
    pub rhobeg: f64,
    /// Final trust-region radius.
    pub rhoend: f64,
}

impl Default for Cobyla {
    fn default() -> Self {
        Self {
            maxiter: 1000,
            tol: 1e-6,
            rhobeg: 0.5,
            rhoend: 1e-4,
        }
    }
}

impl Cobyla {
    /// Create with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    #[must_use]
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set the flatness tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the initial and final trust-region radii.
    #[must_use]
    pub fn with_trust_region(mut self, rhobeg: f64, rhoend: f64) -> Self {
        self.rhobeg = rhobeg;
        self.rhoend = rhoend;
        self
    }

    fn build_simplex<F: FnMut(&[f64]) -> f64>(
        center: &[f64],
        f_center: f64,
        rho: f64,
        objective: &mut Counted<F>,
    ) -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut points = vec![center.to_vec()];
        let mut values = vec![f_center];
        for i in 0..center.len() {
            let mut p = center.to_vec();
            p[i] += rho;
            values.push(objective.eval(&p));
            points.push(p);
        }
        (points, values)
    }
}

impl Optimizer for Cobyla {
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut objective = Counted::new(objective);
        let n = initial_params.len();
        let f0 = objective.eval(&initial_params);

        if n == 0 {
            return OptimizationResult {
                optimal_params: initial_params,
                optimal_value: f0,
                num_evaluations: objective.calls,
                num_iterations: 0,
                history: vec![f0],
                converged: true,
            };
        }

        let mut rho = self.rhobeg;
        let (mut simplex, mut values) = Self::build_simplex(&initial_params, f0, rho, &mut objective);
        let mut history = vec![f0];
        let mut best_value = f0;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.maxiter {
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| cmp_value(values[a], values[b]));
            let best = order[0];
            let worst = order[n];
            let second_worst = order[n - 1];

            let spread = values[worst] - values[best];
            if spread < self.tol && rho <= self.rhoend {
                converged = true;
                break;
            }
            iterations += 1;

            if spread < self.tol {
                rho = (rho * 0.5).max(self.rhoend);
                let center = simplex[best].clone();
                let f_center = values[best];
                (simplex, values) = Self::build_simplex(&center, f_center, rho, &mut objective);
                best_value = lowest(&values).min(best_value);
                history.push(best_value);
                continue;
            }

            let mut centroid = vec![0.0; n];
            for &idx in &order[..n] {
                for (c, x) in centroid.iter_mut().zip(&simplex[idx]) {
                    *c += x;
                }
            }
            centroid.iter_mut().for_each(|c| *c /= n as f64);

            let reflected: Vec<f64> = centroid
                .iter()
                .zip(&simplex[worst])
                .map(|(c, w)| {
                    let step = (c - w).clamp(-rho, rho);
                    c + step
                })
                .collect();
            let f_reflected = objective.eval(&reflected);

            if f_reflected < values[best] {
                let expanded: Vec<f64> = centroid
                    .iter()
                    .zip(&reflected)
                    .map(|(c, r)| c + 2.0 * (r - c))
                    .collect();
                let f_expanded = objective.eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = f_reflected;
                }
            } else if f_reflected < values[second_worst] {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            } else {
                let contracted: Vec<f64> = centroid
                    .iter()
                    .zip(&simplex[worst])
                    .map(|(c, w)| 0.5 * (c + w))
                    .collect();
                let f_contracted = objective.eval(&contracted);
                if f_contracted < values[worst] {
                    simplex[worst] = contracted;
                    values[worst] = f_contracted;
                } else {
                    let anchor = simplex[best].clone();
                    for i in (0..=n).filter(|&i| i != best) {
                        for (x, a) in simplex[i].iter_mut().zip(&anchor) {
                            *x = 0.5 * (*x + a);
                        }
                        values[i] = objective.eval(&simplex[i]);
                    }
                }
            }

            best_value = lowest(&values).min(best_value);
            history.push(best_value);
        }

        let best = (0..=n)
            .min_by(|&a, &b| cmp_value(values[a], values[b]))
            .unwrap_or(0);

        OptimizationResult {
            optimal_params: simplex[best].clone(),
            optimal_value: values[best],
            num_evaluations: objective.calls,
            num_iterations: iterations,
            history,
            converged,
        }
    }
}

/// Simultaneous-perturbation stochastic approximation.
///
/// Gains follow the usual power laws `a_k = a / (k + 1)^alpha` and
/// `c_k = c / (k + 1)^gamma`. Perturbation signs come from a `StdRng`
/// seeded with `seed`, so runs are reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spsa {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Learning-rate scale.
    pub a: f64,
    /// Perturbation scale.
    pub c: f64,
    /// Learning-rate decay exponent.
    pub alpha: f64,
    /// Perturbation decay exponent.
    pub gamma: f64,
    /// Seed for the perturbation directions.
    pub seed: u64,
}

impl Default for Spsa {
    fn default() -> Self {
        Self {
            maxiter: 1000,
            a: 0.2,
            c: 0.1,
            alpha: 0.602,
            gamma: 0.101,
            seed: 42,
        }
    }
}

impl Spsa {
    /// Create with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    #[must_use]
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set the gain scales.
    #[must_use]
    pub fn with_gains(mut self, a: f64, c: f64) -> Self {
        self.a = a;
        self.c = c;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Optimizer for Spsa {
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        use rand::Rng;

        let mut objective = Counted::new(objective);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut x = initial_params;
        let mut f_x = objective.eval(&x);
        let mut best = (x.clone(), f_x);
        let mut history = vec![f_x];

        for k in 0..self.maxiter {
            let k1 = (k + 1) as f64;
            let a_k = self.a / k1.powf(self.alpha);
            let c_k = self.c / k1.powf(self.gamma);

            let delta: Vec<f64> = (0..x.len())
                .map(|_| if rng.r#gen::<bool>() { 1.0 } else { -1.0 })
                .collect();
            let plus: Vec<f64> = x.iter().zip(&delta).map(|(xi, d)| xi + c_k * d).collect();
            let minus: Vec<f64> = x.iter().zip(&delta).map(|(xi, d)| xi - c_k * d).collect();
            let slope = (objective.eval(&plus) - objective.eval(&minus)) / (2.0 * c_k);

            for (xi, d) in x.iter_mut().zip(&delta) {
                // delta_i = ±1, so 1/delta_i = delta_i
                *xi -= a_k * slope * d;
            }

            f_x = objective.eval(&x);
            if cmp_value(f_x, best.1) == Ordering::Less {
                best = (x.clone(), f_x);
            }
            history.push(best.1);
        }

        OptimizationResult {
            optimal_params: best.0,
            optimal_value: best.1,
            num_evaluations: objective.calls,
            num_iterations: self.maxiter,
            history,
            converged: false,
        }
    }
}

/// Optimizer selection for configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    /// [`Cobyla`].
    #[default]
    Cobyla,
    /// [`Spsa`].
    Spsa,
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cobyla => write!(f, "cobyla"),
            Self::Spsa => write!(f, "spsa"),
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cobyla" => Ok(Self::Cobyla),
            "spsa" => Ok(Self::Spsa),
            other => Err(format!("unknown optimizer '{other}'")),
        }
    }
}

/// Either optimizer, chosen at runtime.
#[derive(Debug, Clone)]
pub enum AnyOptimizer {
    /// Simplex search.
    Cobyla(Cobyla),
    /// Stochastic approximation.
    Spsa(Spsa),
}

impl AnyOptimizer {
    /// Build from a kind and the shared settings.
    pub fn from_kind(kind: OptimizerKind, maxiter: usize, tol: f64, seed: u64) -> Self {
        match kind {
            OptimizerKind::Cobyla => {
                Self::Cobyla(Cobyla::new().with_maxiter(maxiter).with_tol(tol))
            }
            OptimizerKind::Spsa => Self::Spsa(Spsa::new().with_maxiter(maxiter).with_seed(seed)),
        }
    }
}

impl Optimizer for AnyOptimizer {
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        match self {
            Self::Cobyla(o) => o.minimize(objective, initial_params),
            Self::Spsa(o) => o.minimize(objective, initial_params),
        }
    }
}
