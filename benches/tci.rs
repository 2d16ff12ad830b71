use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tcisol::prelude::*;

fn schnider() -> ModelParameters {
    ModelParameters::new(4.27, 0.443, 0.302, 0.196, 0.057, 0.0033, 0.456).unwrap()
}

fn induction_targets() -> Vec<f64> {
    let mut targets = vec![4.0; 200];
    targets.extend(vec![3.0; 200]);
    targets.extend(vec![5.0; 160]);
    targets.extend(vec![2.0; 200]);
    targets.extend(vec![0.0; 500]);
    targets
}

fn bench_run(c: &mut Criterion) {
    let scheduler = InfusionScheduler::new(schnider(), Site::Effect).unwrap();
    let targets = induction_targets();
    c.bench_function("scheduler_run_1260_ticks", |b| {
        b.iter(|| scheduler.run(black_box(&targets)).unwrap())
    });
}

fn bench_solver(c: &mut Criterion) {
    let model = CompartmentModel::new(schnider()).unwrap();
    let solver = TciSolver::new(model, Site::Effect).unwrap();
    c.bench_function("solve_from_zero_state", |b| {
        b.iter(|| solver.solve(black_box(&State::zeros()), black_box(4.0)).unwrap())
    });
}

criterion_group!(benches, bench_run, bench_solver);
criterion_main!(benches);
