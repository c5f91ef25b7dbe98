//! Benchmarks for resampling, rolling windows and decomposition.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use econuy_transform::prelude::*;
use econuy_transform::seasonality::{classical_decompose, Unavailable, STL};
use econuy_transform::transform::{centered_moving_average, rolling_mean, rolling_sum};

fn generate_seasonal(n: usize, period: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            100.0
                + 0.3 * i as f64
                + 5.0 * (2.0 * std::f64::consts::PI * i as f64 / period as f64).sin()
        })
        .collect()
}

fn monthly_dataset(n: usize, series_type: SeriesType) -> Dataset {
    let index: Vec<NaiveDate> = Frequency::Monthly
        .grid(
            NaiveDate::from_ymd_opt(1950, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2200, 12, 31).unwrap(),
        )
        .into_iter()
        .take(n)
        .collect();
    Dataset::from_columns(
        index,
        vec![
            ("a", generate_seasonal(n, 12)),
            ("b", generate_seasonal(n, 6)),
        ],
    )
    .unwrap()
    .with_metadata(
        &MetadataUpdate::new()
            .currency("UYU")
            .seasonal_adjustment("NSA")
            .series_type(series_type)
            .cumulative_periods(1),
    )
    .unwrap()
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_kernels");

    for size in [120, 480, 1920].iter() {
        let signal = generate_seasonal(*size, 12);

        group.bench_with_input(BenchmarkId::new("rolling_sum", size), size, |b, _| {
            b.iter(|| rolling_sum(black_box(&signal), 12))
        });

        group.bench_with_input(BenchmarkId::new("rolling_mean", size), size, |b, _| {
            b.iter(|| rolling_mean(black_box(&signal), 12, true))
        });

        group.bench_with_input(
            BenchmarkId::new("centered_moving_average", size),
            size,
            |b, _| b.iter(|| centered_moving_average(black_box(&signal), 12)),
        );
    }

    group.finish();
}

fn bench_dataset_transforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("dataset_transforms");

    for size in [120, 480, 1920].iter() {
        let flow = monthly_dataset(*size, SeriesType::Flow);
        let stock = monthly_dataset(*size, SeriesType::Stock);

        group.bench_with_input(BenchmarkId::new("resample_flow_q", size), size, |b, _| {
            b.iter(|| {
                resample(
                    black_box(&flow),
                    Frequency::Quarterly,
                    ResampleOperation::Sum,
                    Interpolation::Linear,
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("resample_stock_q", size), size, |b, _| {
            b.iter(|| {
                resample(
                    black_box(&stock),
                    Frequency::Quarterly,
                    ResampleOperation::Sum,
                    Interpolation::Linear,
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("rolling_12", size), size, |b, _| {
            b.iter(|| rolling(black_box(&flow), Some(12), RollingOperation::Sum))
        });

        group.bench_with_input(BenchmarkId::new("chg_annual", size), size, |b, _| {
            b.iter(|| chg_diff(black_box(&flow), ChangeOperation::Chg, ChangePeriod::Annual))
        });
    }

    group.finish();
}

fn bench_decomposition(c: &mut Criterion) {
    let mut group = c.benchmark_group("decomposition");
    group.sample_size(20);

    for size in [120, 480].iter() {
        let signal = generate_seasonal(*size, 12);
        let ds = monthly_dataset(*size, SeriesType::Flow);
        let backend = Unavailable(TransformError::BinaryNotFound("x13as".to_string()));

        group.bench_with_input(BenchmarkId::new("STL", size), size, |b, _| {
            let stl = STL::new(12);
            b.iter(|| stl.decompose(black_box(&signal)))
        });

        group.bench_with_input(BenchmarkId::new("classical", size), size, |b, _| {
            b.iter(|| classical_decompose(black_box(&signal), 12))
        });

        group.bench_with_input(BenchmarkId::new("cascade_loess", size), size, |b, _| {
            let options = DecomposeOptions::default();
            b.iter(|| decompose(black_box(&ds), &options, &backend))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_kernels,
    bench_dataset_transforms,
    bench_decomposition
);
criterion_main!(benches);
