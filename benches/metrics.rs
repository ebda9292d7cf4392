// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Annual metric benchmarks

use bsdfview::metrics::{spatial_daylight_autonomy, MetricsTable, MetricsRow};
use bsdfview::results::{compute_metrics, default_schedule, Thresholds};
use bsdfview::Matrix;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Synthetic daylight curve: bright around noon, dark at night
fn illuminance(sensors: usize, hours: usize) -> Matrix {
    let data = (0..sensors * hours)
        .map(|i| {
            let sensor = i / hours;
            let hour = (i % hours) as f32 % 24.0;
            let depth = 1.0 / (1.0 + sensor as f32 * 0.01);
            (((hour - 6.0) / 12.0 * std::f32::consts::PI).sin().max(0.0)) * 4000.0 * depth
        })
        .collect();
    Matrix::new(sensors, hours, data)
}

fn bench_compute_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_metrics");
    let schedule = default_schedule();
    let total_occupied = schedule.iter().filter(|o| **o).count();

    for sensors in [100, 1000] {
        let matrix = illuminance(sensors, 8760);
        group.bench_with_input(BenchmarkId::new("sensors", sensors), &matrix, |b, matrix| {
            b.iter(|| {
                compute_metrics(
                    black_box(matrix),
                    &schedule,
                    total_occupied,
                    Thresholds::default(),
                )
            });
        });
    }

    group.finish();
}

fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("summary");

    let da: Vec<f32> = (0..10_000).map(|i| (i % 101) as f32).collect();
    group.bench_function("sda", |b| {
        b.iter(|| spatial_daylight_autonomy(black_box(&da)));
    });

    let mut table = MetricsTable::new();
    for i in 0..50 {
        table.upsert(MetricsRow {
            name: format!("bsdf_{}", i),
            sda: i as f32,
            average_da: 40.0,
            average_cda: 60.0,
            average_udi: 50.0,
            average_udi_lower: 30.0,
            average_udi_upper: 20.0,
        });
    }
    group.bench_function("html_table", |b| {
        b.iter(|| table.to_html(black_box("bsdf_25")));
    });

    group.finish();
}

criterion_group!(benches, bench_compute_metrics, bench_summary);
criterion_main!(benches);
