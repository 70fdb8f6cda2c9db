//! Benchmark for classification and aggregation passes
//! Run: cargo bench -p pipelens-core --bench aggregate

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pipelens_core::{aggregate, classify, filter_logs, AnalysisView, FilterSelection, Granularity, LogRecord, SeverityLevel};
use std::hint::black_box;

const TOOLS: [&str; 6] = ["maven-build", "k8s-deploy", "unit-tests", "sonarqube", "gitlab", "github_actions"];
const SEVERITIES: [&str; 5] = ["critical", "High", "medium", "low", ""];

// mixed batch: half structured fields, half summary-only records
fn sample_logs(size: usize) -> Vec<LogRecord> {
    (0..size)
        .map(|i| {
            let structured = i % 2 == 0;
            let environment = if i % 3 == 0 { "prod" } else { "staging" };
            let build_success = structured.then_some(i % 5 != 0);
            let build_duration = structured.then_some(60 + i % 300);
            serde_json::from_value(serde_json::json!({
                "project": "checkout",
                "tool": TOOLS[i % TOOLS.len()],
                "environment": environment,
                "server": format!("web-{}", i % 4),
                "severity": SEVERITIES[i % SEVERITIES.len()],
                "timestamp": format!("2026-02-{:02}T{:02}:15:00Z", 1 + i % 28, i % 24),
                "build_success": build_success,
                "build_duration_seconds": build_duration,
                "executive_summary": "Build successful. Build time: 2m 30s. Deployment completed successfully. Code coverage: 81.5%. Bugs: 3",
                "error_count": i % 7,
            }))
            .unwrap()
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let logs = sample_logs(TOOLS.len());

    c.bench_function("classify_mixed_tools", |b| {
        b.iter(|| logs.iter().map(|log| classify(black_box(log))).collect::<Vec<_>>())
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let batch_sizes = [10, 100, 1000, 10000];

    let mut group = c.benchmark_group("aggregate");

    for size in batch_sizes {
        let logs = sample_logs(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("records", size), &logs, |b, logs| {
            b.iter(|| aggregate(black_box(logs)))
        });
    }

    group.finish();
}

fn bench_filter_and_view(c: &mut Criterion) {
    let logs = sample_logs(1000);
    let selection = FilterSelection::new()
        .with_environment("prod")
        .with_severity(SeverityLevel::High);

    let mut group = c.benchmark_group("view");

    group.bench_function("filter_1000", |b| {
        b.iter(|| filter_logs(black_box(&logs), &selection))
    });

    group.bench_function("compute_view_1000", |b| {
        b.iter(|| AnalysisView::compute(black_box(&logs), &FilterSelection::new(), Granularity::Day))
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_aggregate, bench_filter_and_view);

criterion_main!(benches);
