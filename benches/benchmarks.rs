/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Micro-benchmarks for the solver hot path
//!
//! The dense per-mode solves of the Poisson step dominate the runtime of the
//! whole pipeline; track them together with the reciprocal-space density
//! builder they consume.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slabcor::cell::CellGrid;
use slabcor::model::{dielectric_profile, gaussian_density, DielectricModel};
use slabcor::poisson;

fn poisson_solve_bench(c: &mut Criterion) {
    let cell = CellGrid::new([16.0; 3], [24, 24, 24], 2).unwrap();
    let model = DielectricModel {
        diel_in: [4.0, 4.0, 6.0],
        diel_out: [1.0, 1.0, 1.0],
        taper: 1.0,
    };
    let diels = dielectric_profile(&cell, [0.3, 0.7], &model);
    let rho = gaussian_density(&cell, 1.0, [8.0, 8.0, 8.0], 1.5);

    c.bench_function("poisson_solve_24", |b| {
        b.iter(|| poisson::solve(&cell, black_box(&rho), black_box(&diels)).unwrap())
    });
}

fn gaussian_density_bench(c: &mut Criterion) {
    let cell = CellGrid::new([20.0; 3], [48, 48, 48], 2).unwrap();

    c.bench_function("gaussian_density_48", |b| {
        b.iter(|| gaussian_density(&cell, black_box(1.0), black_box([10.0, 10.0, 10.0]), 2.0))
    });
}

criterion_group!(benches, poisson_solve_bench, gaussian_density_bench);
criterion_main!(benches);
