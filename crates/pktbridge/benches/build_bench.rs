//! Packet build/read benchmarks
//!
//! # Scenarios
//!
//! 1. **Build**: header count and payload size sweep through the full
//!    allocation bridge round trip
//! 2. **Lookup**: `find_header` against the last key of a wide table
//! 3. **Header map**: materializing the derived map view

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pktbridge::{Header, PacketBuilder};

fn make_headers(n: usize) -> Vec<Header> {
    (0..n)
        .map(|i| Header::new(format!("key-{}", i), format!("value-{}", i)))
        .collect()
}

// ============================================================================
// Build
// ============================================================================

fn bench_build(c: &mut Criterion) {
    let builder = PacketBuilder::new();
    let mut group = c.benchmark_group("build");

    for &(headers, payload) in &[(0usize, 0usize), (4, 64), (16, 1024), (64, 64 * 1024)] {
        let hdrs = make_headers(headers);
        let body = vec![0xa5u8; payload];
        group.throughput(Throughput::Bytes(payload as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}h_{}b", headers, payload)),
            &(hdrs, body),
            |b, (hdrs, body)| {
                b.iter(|| {
                    let handle = builder.build(black_box(hdrs), black_box(body)).unwrap();
                    black_box(handle.packed_len().unwrap())
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Reads
// ============================================================================

fn bench_reads(c: &mut Criterion) {
    let builder = PacketBuilder::new();
    let hdrs = make_headers(256);
    let handle = builder.build(&hdrs, b"payload").unwrap();
    let last = hdrs[hdrs.len() - 1].key.clone();

    c.bench_function("find_header_last_of_256", |b| {
        b.iter(|| black_box(handle.reader().find_header(black_box(&last)).unwrap()))
    });

    c.bench_function("header_map_256", |b| {
        b.iter(|| black_box(handle.reader().header_map().unwrap().len()))
    });
}

criterion_group!(benches, bench_build, bench_reads);
criterion_main!(benches);
