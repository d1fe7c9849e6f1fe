//! Kernel microbenchmarks - pure slice operations
//!
//! Run with: cargo bench --bench kernels
//!
//! Metrics:
//! - ns/element
//! - throughput (GB/s, fused traffic)
//! - fused vs naive multiply-add per cache tier
//!
//! Sizes are picked so the fused working set (4 arrays) lands in L1, L2,
//! L3 and DRAM on a 32 KiB / 1 MiB / 32 MiB machine.

use colfuse::builtins::kernels::{fma_naive, Arith};
use colfuse::builtins::kernels_fused::{mul_add_no_alloc, mul_add_sharded};
use colfuse::Bf16;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SIZES: [usize; 4] = [1 << 10, 1 << 15, 1 << 20, 1 << 24];

fn inputs<T: Arith>(n: usize, from: impl Fn(f32) -> T) -> (Vec<T>, Vec<T>, Vec<T>) {
    let a = (0..n).map(|i| from(1.0 + (i % 64) as f32 * 0.125)).collect();
    let b = (0..n).map(|i| from(0.5 + (i % 32) as f32 * 0.25)).collect();
    let c = (0..n).map(|i| from((i % 16) as f32)).collect();
    (a, b, c)
}

fn bench_mul_add<T: Arith>(c: &mut Criterion, name: &str, from: impl Fn(f32) -> T + Copy) {
    let mut group = c.benchmark_group(format!("mul_add_{name}"));

    for n in SIZES {
        let (a, b, cc) = inputs(n, from);
        let mut out = vec![T::default(); n];
        group.throughput(Throughput::Bytes((4 * n * std::mem::size_of::<T>()) as u64));

        // Two passes, intermediate buffer
        group.bench_with_input(BenchmarkId::new("naive", n), &n, |bench, _| {
            bench.iter(|| fma_naive(black_box(&mut out), &a, &b, &cc))
        });

        // One pass
        group.bench_with_input(BenchmarkId::new("fused", n), &n, |bench, _| {
            bench.iter(|| mul_add_no_alloc(black_box(&mut out), &a, &b, &cc))
        });

        // One pass, rayon shards
        group.bench_with_input(BenchmarkId::new("fused_sharded", n), &n, |bench, _| {
            bench.iter(|| mul_add_sharded(black_box(&mut out), &a, &b, &cc, 1))
        });
    }

    group.finish();
}

fn bench_kernels(c: &mut Criterion) {
    bench_mul_add(c, "f32", |v| v);
    bench_mul_add(c, "i32", |v| v as i32);
    bench_mul_add(c, "bf16", Bf16::from_f32);
}

criterion_group!(benches, bench_kernels);
criterion_main!(benches);
