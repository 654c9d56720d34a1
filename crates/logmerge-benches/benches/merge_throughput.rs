// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Benchmark: merge throughput over `k` immediate sources.
//!
//! Sources yield without latency, so this measures scheduler overhead (frontier
//! heap, gate bookkeeping, per-tick admission) rather than fetch time.
//! Throughput "elements" are emitted entries (`k * PER_SOURCE`).
//! BatchSize::SmallInput keeps source construction out of the timing.
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use logmerge_core::{merge_sync, AsyncMerge, Entry, MergeConfig, ReplaySource};

const PER_SOURCE: u64 = 1_000;

fn build_sources(k: u64) -> Vec<ReplaySource> {
    (0..k)
        .map(|s| {
            // Interleaved stride so every emission switches source.
            (0..PER_SOURCE)
                .map(|i| Entry::new(i * k + s, "bench"))
                .collect()
        })
        .collect()
}

fn bench_sync_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_merge");
    for &k in &[2u64, 8, 64] {
        group.throughput(Throughput::Elements(k * PER_SOURCE));
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter_batched(
                || (build_sources(k), Vec::<Entry>::new()),
                |(sources, mut out)| {
                    let stats = merge_sync(sources, &mut out, MergeConfig::default());
                    criterion::black_box((stats.is_ok(), out.len()));
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_async_merge(c: &mut Criterion) {
    let Ok(rt) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };
    let mut group = c.benchmark_group("async_merge");
    for &k in &[2u64, 8, 64] {
        group.throughput(Throughput::Elements(k * PER_SOURCE));
        for (label, max_in_flight) in [("full", None), ("single", Some(1))] {
            let mut config = MergeConfig::default();
            config.max_in_flight = max_in_flight;
            group.bench_with_input(BenchmarkId::new(label, k), &k, |b, &k| {
                b.iter_batched(
                    || (build_sources(k), Vec::<Entry>::new()),
                    |(sources, mut out)| {
                        let ok = rt.block_on(async {
                            match AsyncMerge::new(sources, &mut out, config) {
                                Ok(mut merge) => merge.run().await.is_ok(),
                                Err(_) => false,
                            }
                        });
                        criterion::black_box((ok, out.len()));
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_sync_merge, bench_async_merge);
criterion_main!(benches);
