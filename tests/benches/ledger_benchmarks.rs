//! # DAG Ledger Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | dag-03-graph | graph metrics for a new unit on chains of growing length |
//! | dag-05-transaction | compose, review and apply throughput |
//! | shared-types | canonical unit hashing |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use dag_01_storage::{DagStore, InMemoryKVStore};
use dag_03_graph::GraphInfoGetter;
use dag_04_ledger::{GenesisBuilder, GenesisConfig};
use dag_05_transaction::{LedgerConfig, TransactionService};
use shared_bus::InMemoryEventBus;
use shared_types::Address;
use std::sync::Arc;
use std::time::Duration;

fn witnesses() -> Vec<Address> {
    (1..=12).map(|b| Address([b; 20])).collect()
}

fn service() -> TransactionService {
    let store = DagStore::new(Arc::new(InMemoryKVStore::new()));
    GenesisBuilder::new(GenesisConfig {
        witnesses: witnesses(),
        balance: 10_000_000,
        timestamp: 0,
    })
    .bootstrap(&store)
    .expect("genesis");
    TransactionService::new(store, LedgerConfig::default(), Arc::new(InMemoryEventBus::new()))
}

/// Linear chain of heartbeats cycling through the witnesses.
fn chain(service: &TransactionService, length: usize) {
    let w = witnesses();
    for i in 0..length {
        let author = w[i % w.len()];
        let unit = service.compose_payment(author, author, 1).expect("compose");
        service.review_unit(&unit).expect("review");
        service.handle_new_unit(&unit).expect("apply");
    }
}

// ============================================================================
// dag-03: Graph metrics
// ============================================================================

fn bench_graph_info(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag-03-graph");
    group.measurement_time(Duration::from_secs(10));

    for length in [20, 50, 100] {
        let service = service();
        chain(&service, length);
        let tips = service.tip_set().tips().expect("tips");
        let list = witnesses();

        group.bench_with_input(BenchmarkId::new("witnessed_level", length), &length, |b, _| {
            b.iter(|| {
                let info = GraphInfoGetter::new(service.store(), &tips, &list).expect("info");
                black_box(info.witnessed_level().expect("witnessed level"))
            })
        });
        group.bench_with_input(BenchmarkId::new("last_stable_ball", length), &length, |b, _| {
            b.iter(|| {
                let info = GraphInfoGetter::new(service.store(), &tips, &list).expect("info");
                black_box(info.last_stable_ball().expect("last stable ball"))
            })
        });
    }

    group.finish();
}

// ============================================================================
// dag-05: Submission path
// ============================================================================

fn bench_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag-05-transaction");
    group.measurement_time(Duration::from_secs(10));

    for units in [10, 30] {
        group.throughput(Throughput::Elements(units as u64));
        group.bench_with_input(BenchmarkId::new("compose_review_apply", units), &units, |b, &n| {
            b.iter_batched(service, |service| chain(&service, n), BatchSize::SmallInput)
        });
    }

    group.finish();
}

// ============================================================================
// shared-types: Hashing
// ============================================================================

fn bench_unit_hash(c: &mut Criterion) {
    let service = service();
    let w = witnesses();
    let unit = service.compose_payment(w[0], w[1], 1000).expect("compose");

    c.bench_function("shared-types/content_hash", |b| {
        b.iter(|| black_box(unit.content_hash()))
    });
}

criterion_group!(benches, bench_graph_info, bench_submission, bench_unit_hash);
criterion_main!(benches);
