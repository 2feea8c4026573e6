//! Benchmark for synthsim simulation performance.

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use synthsim::carry::CarryOverlay;
use synthsim::core::types::PriceSeries;
use synthsim::simulation::{simulate, SimulationParameters};
use synthsim::sweep::{run_sweep, SweepGrid};

/// Generate a trending daily price series.
fn generate_prices(n: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    let dates = (0..n).map(|i| start + Duration::days(i as i64)).collect();

    let mut close = vec![100.0; n];
    for i in 1..n {
        let change = (i as f64 * 0.1).sin() * 0.8 + 0.05;
        close[i] = (close[i - 1] + change).max(1.0);
    }
    PriceSeries::new(dates, close, None).unwrap()
}

fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    let params = SimulationParameters::default();

    for size in [2_520, 10_000, 50_000].iter() {
        group.bench_with_input(BenchmarkId::new("days", size), size, |b, &size| {
            let prices = generate_prices(size);

            b.iter(|| {
                let result = simulate(black_box(&prices), black_box(&params), None);
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_carry_overlay(c: &mut Criterion) {
    let prices = generate_prices(10_000);
    let result = simulate(&prices, &SimulationParameters::default(), None).unwrap();
    let overlay = CarryOverlay::new(0.036).with_roll_friction(1.3, 1);

    c.bench_function("carry_overlay_10000", |b| {
        b.iter(|| black_box(overlay.apply(black_box(&result))))
    });
}

fn bench_sweep(c: &mut Criterion) {
    let prices = generate_prices(5_000);
    let grid = SweepGrid::new(SimulationParameters::default())
        .roll_intervals([1, 3, 6, 12])
        .margin_pcts([0.15, 0.2, 0.25, 0.3]);

    c.bench_function("sweep_16_points", |b| {
        b.iter(|| black_box(run_sweep(black_box(&prices), None, &grid)))
    });
}

criterion_group!(benches, bench_simulate, bench_carry_overlay, bench_sweep);
criterion_main!(benches);
