//! Criterion benchmarks for the bulk UPDATE strategies
//!
//! Run with: cargo bench
//!
//! The `update_bench` binary gives the quick side-by-side table; this suite
//! gives criterion's statistics for a smaller table and a few batch sizes.
//! A new workload is drawn for every sample so repeated samples never hit
//! the same cached rows.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::time::Duration;

use bulk_update_bench::strategy::{
    PerRowPrepared, PerRowUnprepared, StagingTable, TextBatches, TransactionPerRowPrepared,
    TransactionPreparedInList,
};
use bulk_update_bench::{setup, RowId, Session, Strategy, WorkloadGenerator};

const TOTAL_ROWS: RowId = 20_000;
const UPDATE_COUNT: usize = 800;

fn seeded() -> (Session, WorkloadGenerator) {
    let session = Session::open_in_memory().unwrap();
    let mut workload = WorkloadGenerator::new(0, TOTAL_ROWS, UPDATE_COUNT).unwrap();
    setup::prepare_table(&session, TOTAL_ROWS, workload.rng()).unwrap();
    (session, workload)
}

fn bench_strategy(c: &mut Criterion, group_name: &str, strategy: &dyn Strategy, portions: &[usize]) {
    let mut group = c.benchmark_group(group_name);
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(UPDATE_COUNT as u64));

    let (session, mut workload) = seeded();
    for &portion in portions {
        group.bench_with_input(BenchmarkId::from_parameter(portion), &portion, |b, &portion| {
            b.iter_batched(
                || workload.next_workload(),
                |rids| strategy.run(&session, black_box(&rids), portion).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_per_row(c: &mut Criterion) {
    bench_strategy(c, "Per-row unprepared", &PerRowUnprepared, &[0]);
    bench_strategy(c, "Per-row prepared", &PerRowPrepared, &[0]);
    bench_strategy(c, "Per-row prepared, one transaction", &TransactionPerRowPrepared, &[0]);
}

fn bench_grouped(c: &mut Criterion) {
    bench_strategy(c, "Prepared IN list of 8", &TransactionPreparedInList::new(8), &[0]);
    bench_strategy(
        c,
        "Text batches, one transaction",
        &TextBatches::in_transaction(),
        &[8, 100, 250],
    );
    bench_strategy(c, "Text batches, autocommit", &TextBatches::autocommit(), &[8, 100, 250]);
}

fn bench_staging(c: &mut Criterion) {
    bench_strategy(c, "Staging table", &StagingTable, &[25, 100]);
}

criterion_group!(benches, bench_per_row, bench_grouped, bench_staging);
criterion_main!(benches);
