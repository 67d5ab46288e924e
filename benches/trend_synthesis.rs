use batchwatch::data::{expand, expand_count_series};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark expanding one value over varying windows
fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");

    for days in [7usize, 30, 365].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(days), days, |b, &days| {
            b.iter(|| expand(black_box(147.0), black_box(days), black_box(42)));
        });
    }
    group.finish();
}

/// Benchmark count distribution over varying windows
fn bench_count_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_count_series");

    for days in [7usize, 30, 365].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(days), days, |b, &days| {
            b.iter(|| expand_count_series(black_box(1_000), black_box(days), black_box(42)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_expand, bench_count_series);
criterion_main!(benches);
