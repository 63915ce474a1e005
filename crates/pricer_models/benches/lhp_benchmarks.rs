//! Criterion benchmarks for the Gaussian LHP loss model.
//!
//! Measures the closed-form expected tranche loss and the basket-level
//! queries on an index-sized (125 name) basket.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_core::types::time::Date;
use pricer_models::credit::{FlatHazardBasket, GaussianLhpModel};

const NAMES: usize = 125;

fn setup(attach: f64, detach: f64) -> (GaussianLhpModel, FlatHazardBasket, Date) {
    let today = Date::from_ymd(2026, 3, 20).unwrap();
    let hazards: Vec<f64> = (0..NAMES).map(|i| 0.005 + 0.0002 * i as f64).collect();
    let basket = FlatHazardBasket::new(today, 1.0e7, hazards, attach, detach).unwrap();
    let model = GaussianLhpModel::new(0.25, vec![0.4; NAMES]).unwrap();
    (model, basket, Date::from_ymd(2031, 6, 20).unwrap())
}

/// Benchmark the raw closed form across the standard tranche structure.
fn bench_expected_tranche_loss_impl(c: &mut Criterion) {
    let mut group = c.benchmark_group("lhp_etl_impl");
    let model = GaussianLhpModel::new(0.25, vec![0.4]).unwrap();

    for (attach, detach) in [(0.0, 0.03), (0.03, 0.07), (0.07, 0.1), (0.15, 0.3)] {
        let label = format!("{}-{}", attach, detach);
        group.bench_with_input(
            BenchmarkId::new("tranche", label),
            &(attach, detach),
            |b, &(attach, detach)| {
                b.iter(|| {
                    model.expected_tranche_loss_impl(
                        black_box(1.0),
                        black_box(0.05),
                        black_box(0.4),
                        black_box(attach),
                        black_box(detach),
                    )
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the basket-level queries, including the basket scan.
fn bench_basket_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("lhp_basket");
    let (model, basket, horizon) = setup(0.03, 0.07);

    group.bench_function("expected_tranche_loss", |b| {
        b.iter(|| model.expected_tranche_loss(black_box(&basket), black_box(horizon)));
    });
    group.bench_function("prob_over_loss", |b| {
        b.iter(|| model.prob_over_loss(black_box(&basket), black_box(horizon), black_box(0.5)));
    });
    group.bench_function("expected_shortfall_99", |b| {
        b.iter(|| model.expected_shortfall(black_box(&basket), black_box(horizon), black_box(0.99)));
    });

    group.finish();
}

criterion_group!(benches, bench_expected_tranche_loss_impl, bench_basket_queries);
criterion_main!(benches);
