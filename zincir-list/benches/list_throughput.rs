//! Throughput benchmarks for the versioned list

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use std::sync::Arc;
use std::thread;
use zincir_list::VersionedList;

fn bench_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("inserts");

    group.bench_function("insert_head", |b| {
        b.iter_batched(
            VersionedList::<u64>::new,
            |list| {
                for i in 0..1_000 {
                    list.insert_head(i);
                }
                list
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("insert_tail", |b| {
        b.iter_batched(
            VersionedList::<u64>::new,
            |list| {
                for i in 0..1_000 {
                    list.insert_tail(i);
                }
                list
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_snapshot_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_iter");

    for size in [100u64, 1_000, 10_000].iter() {
        let list = VersionedList::new();
        for i in 0..*size {
            list.insert_head(i);
        }
        group.throughput(Throughput::Elements(*size));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut sum = 0u64;
                for e in list.iter() {
                    sum = sum.wrapping_add(e);
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_mixed_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_concurrent");
    group.sample_size(10);

    for threads in [2u64, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("head_tail_remove", threads),
            threads,
            |b, &num_threads| {
                b.iter(|| {
                    let list = Arc::new(VersionedList::new());
                    let handles: Vec<_> = (0..num_threads)
                        .map(|t| {
                            let list = list.clone();
                            thread::spawn(move || {
                                let mut rng = StdRng::seed_from_u64(t);
                                for i in 0..1_000u64 {
                                    let e = t * 1_000 + i;
                                    if rng.gen_bool(0.5) {
                                        list.insert_head(e);
                                    } else {
                                        list.insert_tail(e);
                                    }
                                    if i % 2 == 0 {
                                        black_box(list.remove_head());
                                    }
                                }
                            })
                        })
                        .collect();
                    for h in handles {
                        h.join().unwrap();
                    }
                    black_box(list.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_txn_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("txn_commit");

    group.bench_function("stage_and_commit_8", |b| {
        b.iter_batched(
            || {
                let list = VersionedList::new();
                for i in 0..64u64 {
                    list.insert_tail(i);
                }
                list
            },
            |list| {
                let mut txn = list.begin().unwrap();
                for i in 0..4u64 {
                    txn.insert_tail(1_000 + i);
                    txn.insert_after(i, 2_000 + i);
                }
                txn.commit();
                list
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_inserts,
    bench_snapshot_iteration,
    bench_mixed_concurrent,
    bench_txn_commit
);
criterion_main!(benches);
