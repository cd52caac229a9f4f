//! Region edit benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use seqarc_bench::{archived_region, random_sequence};
use seqarc_core::Region;

const REGION_LEN: usize = 1_000_000;

/// Benchmark chunking raw content into a region.
fn bench_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");
    let content = random_sequence(REGION_LEN);

    for capacity in [1_000usize, 10_000, 100_000].iter() {
        group.throughput(Throughput::Bytes(REGION_LEN as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            capacity,
            |b, &capacity| {
                b.iter(|| {
                    let region =
                        Region::from_content(None, "bench", capacity, black_box(&content)).unwrap();
                    black_box(region.segment_count());
                });
            },
        );
    }
    group.finish();
}

/// Benchmark a size-preserving edit in the middle of an archived region.
fn bench_overwrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("overwrite");

    for capacity in [1_000usize, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            capacity,
            |b, &capacity| {
                let (mut region, mut store) = archived_region(REGION_LEN, capacity);
                let patch = random_sequence(64);
                let at = (REGION_LEN / 2) as i64;

                b.iter(|| {
                    region
                        .write(&mut store, black_box(&patch), at..at + 64)
                        .unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark an insertion that shifts every following segment.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.sample_size(20);

    for len in [10_000usize, 100_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, &len| {
            let patch = random_sequence(16);
            b.iter_with_setup(
                || archived_region(len, 1_000),
                |(mut region, mut store)| {
                    region.write(&mut store, black_box(&patch), 5..5).unwrap();
                    black_box(region.size());
                },
            );
        });
    }
    group.finish();
}

/// Benchmark reading a slice from archived segments.
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    let (region, store) = archived_region(REGION_LEN, 10_000);

    for span in [100i64, 10_000, 100_000].iter() {
        group.throughput(Throughput::Bytes(*span as u64));
        group.bench_with_input(BenchmarkId::from_parameter(span), span, |b, &span| {
            b.iter(|| {
                let data = region.read(&store, black_box(1_000..1_000 + span)).unwrap();
                black_box(data);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chunking, bench_overwrite, bench_insert, bench_read);
criterion_main!(benches);
