//! Criterion benchmarks for `emic-core`.
//!
//! Tree construction, a full inference run and the metrics of the result.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emic_core::{generate, infer, HistoryTree, InferenceConfig, MetricsReport, SourceParams};

fn bench_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_tree");
    let seq = generate(100_000, 42, &SourceParams::GoldenMean { p: 0.5 }).unwrap();

    for depth in [3usize, 6, 10] {
        group.bench_with_input(BenchmarkId::new("build", depth), &depth, |bench, &depth| {
            bench.iter(|| black_box(HistoryTree::build(black_box(&seq), depth, 20)));
        });
    }
    group.finish();
}

fn bench_infer(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer");
    group.sample_size(20);

    for (name, params) in [
        ("golden_mean", SourceParams::GoldenMean { p: 0.5 }),
        ("even_process", SourceParams::EvenProcess { p: 0.5 }),
    ] {
        let seq = generate(100_000, 42, &params).unwrap();
        for parallel in [false, true] {
            let config = InferenceConfig::default()
                .with_max_history_length(5)
                .with_parallel(parallel);
            let id = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(id, name), &config, |bench, config| {
                bench.iter(|| black_box(infer(black_box(&seq), config).unwrap()));
            });
        }
    }
    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    for (name, params) in [
        ("golden_mean", SourceParams::GoldenMean { p: 0.5 }),
        ("even_process", SourceParams::EvenProcess { p: 0.5 }),
        ("periodic_7", SourceParams::Periodic {
            pattern: vec![0, 1, 1, 0, 1, 0, 0],
        }),
    ] {
        let model = params.reference_model().unwrap();
        group.bench_with_input(BenchmarkId::new("report", name), &model, |bench, model| {
            bench.iter(|| black_box(MetricsReport::compute(black_box(model)).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tree, bench_infer, bench_metrics);
criterion_main!(benches);
