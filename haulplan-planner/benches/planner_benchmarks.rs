//! Criterion benchmarks for delivery planning.
//!
//! Measures greedy route construction and a full in-memory planning run
//! across backlog sizes (25, 50, 100 destinations).
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package haulplan-planner
//! ```

#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use haulplan_core::test_support::{MemoryPackageSource, TableDistanceLookup};
use haulplan_core::{CallContext, Truck};
use haulplan_planner::{
    DistanceProvider, OrchestratorConfig, PlanLimits, PlanOrchestrator, PlanRequest, plan_route,
};


use bench_support::{BENCHMARK_SEED, HUB, generate_network};

/// Destination counts to benchmark.
const BACKLOG_SIZES: &[usize] = &[25, 50, 100];

/// Trucks used for the end-to-end benchmark.
const FLEET_SIZE: usize = 4;

fn depart_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Single-truck greedy ordering over a precomputed matrix.
fn bench_route_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_route");
    for &size in BACKLOG_SIZES {
        let generated = generate_network(size, BENCHMARK_SEED);
        let matrix = generated.matrix();
        let mut truck = Truck::new(1, generated.packages.len(), HUB);
        if truck.load_all(generated.packages.iter().cloned()).is_err() {
            continue;
        }

        group.throughput(Throughput::Elements(u64::try_from(size).unwrap_or(u64::MAX)));
        group.bench_with_input(BenchmarkId::new("destinations", size), &size, |b, _| {
            b.iter(|| plan_route(&truck, &matrix, depart_at(), true));
        });
    }
    group.finish();
}

/// Validation, grouping, banding, matrix fan-out and routing against an
/// in-memory distance table.
fn bench_plan_deliveries(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_deliveries");
    group.measurement_time(Duration::from_secs(10));
    let Ok(runtime) = tokio::runtime::Builder::new_multi_thread().enable_all().build() else {
        return;
    };

    for &size in BACKLOG_SIZES {
        let generated = generate_network(size, BENCHMARK_SEED);
        let capacity = generated.packages.len();
        let orchestrator = PlanOrchestrator::new(
            Arc::new(MemoryPackageSource::with_packages(generated.packages.clone())),
            DistanceProvider::Batch(Arc::new(TableDistanceLookup::new(generated.network))),
        )
        .with_config(OrchestratorConfig::default().with_limits(PlanLimits {
            max_trucks: FLEET_SIZE,
            max_capacity: capacity,
        }));
        let request = PlanRequest::new(HUB, FLEET_SIZE, capacity, depart_at());

        group.throughput(Throughput::Elements(u64::try_from(size).unwrap_or(u64::MAX)));
        group.bench_with_input(BenchmarkId::new("destinations", size), &size, |b, _| {
            b.iter(|| {
                runtime.block_on(orchestrator.plan_deliveries(&request, &CallContext::default()))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_route_construction, bench_plan_deliveries);
criterion_main!(benches);
