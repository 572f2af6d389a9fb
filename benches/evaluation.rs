//! Benchmarks for expiration evaluation and cleanup scans.
//!
//! Measures the per-resource cost of the decision path and a full dry-run
//! scan over populations of increasing size:
//! - `parse_ttl` on valid and invalid inputs
//! - `ExpirationEvaluator::evaluate` on each outcome
//! - `CleanupOrchestrator::cleanup_by_kind` (dry run) over the in-memory provider

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use cloudreap::lifecycle::parse_ttl;
use cloudreap::models::LabelMap;
use cloudreap::{
    CleanupOrchestrator, ExpirationEvaluator, FixedClock, InMemoryProvider, ResourceDescriptor,
    ResourceKind, Scope,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0)
        .single()
        .expect("valid date")
}

fn labels(managed_by: &str, created_at: &str, ttl: &str) -> LabelMap {
    [
        ("managed-by", managed_by),
        ("created-at", created_at),
        ("ttl", ttl),
        ("owner", "bench"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn bench_parse_ttl(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_ttl");
    for input in ["7d", "720h", "never", "1w"] {
        group.bench_with_input(BenchmarkId::from_parameter(input), input, |b, input| {
            b.iter(|| parse_ttl(black_box(input)));
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let evaluator = ExpirationEvaluator::new();
    let cases = [
        ("expired", labels("mcp", "20250101-000000", "7d")),
        ("active", labels("mcp", "20250119-000000", "7d")),
        ("permanent", labels("mcp", "20250101-000000", "never")),
        ("unmanaged", labels("terraform", "20250101-000000", "1h")),
        ("malformed", labels("mcp", "2025-01-01", "7d")),
    ];

    let mut group = c.benchmark_group("evaluate");
    for (name, labels) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), labels, |b, labels| {
            b.iter(|| evaluator.evaluate(black_box(Some(labels)), now()));
        });
    }
    group.finish();
}

fn bench_dry_run_scan(c: &mut Criterion) {
    let zone = Scope::zone("bench-zone");
    let mut group = c.benchmark_group("dry_run_scan");

    for size in [100usize, 1_000, 10_000] {
        let provider = Arc::new(InMemoryProvider::new(ResourceKind::ComputeInstance));
        for i in 0..size {
            // Every third resource is expired.
            let created_at = if i % 3 == 0 {
                "20250101-000000"
            } else {
                "20250119-000000"
            };
            provider
                .insert(
                    &zone,
                    ResourceDescriptor::new(ResourceKind::ComputeInstance, format!("vm-{i:05}"), "RUNNING")
                        .with_labels(labels("mcp", created_at, "7d")),
                )
                .expect("insert");
        }
        let orchestrator =
            CleanupOrchestrator::new(Arc::new(FixedClock::new(now()))).with_provider(provider);

        group.throughput(Throughput::Elements(u64::try_from(size).expect("size fits u64")));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                tokio_test::block_on(orchestrator.cleanup_by_kind(
                    ResourceKind::ComputeInstance,
                    black_box(&zone),
                    true,
                ))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_ttl, bench_evaluate, bench_dry_run_scan);
criterion_main!(benches);
