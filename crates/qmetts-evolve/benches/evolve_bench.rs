//! Benchmarks for tangent states and evolution steps
//!
//! Run with: cargo bench -p qmetts-evolve

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qmetts_evolve::{
    Ansatz, EvolverConfig, ImaginaryTimeEvolver, TimeEvolutionProblem, TwoLocal, TwoLocalConfig,
    VarQite, tangent_states,
};
use qmetts_sim::LmgModel;

fn ansatz(n: usize) -> TwoLocal {
    TwoLocal::new(
        n,
        TwoLocalConfig {
            reps: 2,
            ..TwoLocalConfig::default()
        },
    )
    .unwrap()
}

fn bench_tangent_states(c: &mut Criterion) {
    let mut group = c.benchmark_group("tangent_states");
    for n in &[2usize, 4, 6, 8] {
        let ansatz = ansatz(*n);
        let theta: Vec<f64> = (0..ansatz.num_parameters()).map(|k| 0.1 * k as f64).collect();
        group.bench_with_input(BenchmarkId::new("two_local", n), &theta, |b, theta| {
            b.iter(|| tangent_states(black_box(&ansatz), black_box(theta)).unwrap());
        });
    }
    group.finish();
}

fn bench_qite(c: &mut Criterion) {
    let model = LmgModel::new(4, 0.5, 1.0).unwrap();
    let problem = TimeEvolutionProblem::new(model.hamiltonian().unwrap(), 0.1).unwrap();
    let qite = VarQite::new(Box::new(ansatz(4)))
        .with_config(EvolverConfig::default().with_num_timesteps(10));
    let start = vec![0.2; qite.ansatz().num_parameters()];
    c.bench_function("varqite_lmg4_10_steps", |b| {
        b.iter(|| qite.evolve(black_box(&problem), black_box(&start)).unwrap())
    });
}

criterion_group!(benches, bench_tangent_states, bench_qite);
criterion_main!(benches);
