//! Naive elementwise kernels: one pass per operator
//!
//! Each kernel reads its operands once and writes one full output buffer.
//! A chain of N operators therefore materializes N-1 intermediates.

use rayon::prelude::*;

use crate::table::Bf16;

/// Elements per parallel shard (256 KiB of f32, one L2-sized block)
pub const SHARD_ELEMS: usize = 64 * 1024;

/// Binary arithmetic operators supported by the kernels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
}

impl BinaryOp {
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
        }
    }
}

/// Per-representation arithmetic.
///
/// Every operator rounds (or wraps) on its own. `mul_add` is `a*b` rounded,
/// then `+ c` rounded, never a single-rounding hardware FMA, so the fused
/// kernel agrees bit-for-bit with the two-pass chain.
pub trait Arith: Copy + Default + Send + Sync + 'static {
    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        self.mul(b).add(c)
    }

    #[inline(always)]
    fn apply(op: BinaryOp, a: Self, b: Self) -> Self {
        match op {
            BinaryOp::Add => a.add(b),
            BinaryOp::Sub => a.sub(b),
            BinaryOp::Mul => a.mul(b),
        }
    }
}

impl Arith for i32 {
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }
}

impl Arith for f32 {
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
}

impl Arith for Bf16 {
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Bf16::from_f32(self.to_f32() + rhs.to_f32())
    }
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Bf16::from_f32(self.to_f32() - rhs.to_f32())
    }
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Bf16::from_f32(self.to_f32() * rhs.to_f32())
    }
}

/// Run `kernel(offset, out_chunk)` over `out`, sharded across the rayon pool
/// once `out` reaches `parallel_threshold` elements (0 disables sharding).
///
/// Shards are disjoint output ranges, so the result is identical to the
/// sequential run.
pub fn shard<T, F>(out: &mut [T], parallel_threshold: usize, kernel: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    if parallel_threshold == 0 || out.len() < parallel_threshold {
        kernel(0, out);
        return;
    }
    out.par_chunks_mut(SHARD_ELEMS)
        .enumerate()
        .for_each(|(i, chunk)| kernel(i * SHARD_ELEMS, chunk));
}

/// out[i] = a[i] op b[i]
#[inline]
pub fn binary_no_alloc<T: Arith>(out: &mut [T], a: &[T], b: &[T], op: BinaryOp) {
    assert_eq!(out.len(), a.len());
    assert_eq!(out.len(), b.len());

    match op {
        BinaryOp::Add => zip_with(out, a, b, T::add),
        BinaryOp::Sub => zip_with(out, a, b, T::sub),
        BinaryOp::Mul => zip_with(out, a, b, T::mul),
    }
}

/// out[i] = a[i] op s
#[inline]
pub fn binary_scalar_rhs<T: Arith>(out: &mut [T], a: &[T], s: T, op: BinaryOp) {
    assert_eq!(out.len(), a.len());

    for (o, &x) in out.iter_mut().zip(a) {
        *o = T::apply(op, x, s);
    }
}

/// out[i] = s op b[i]
#[inline]
pub fn binary_scalar_lhs<T: Arith>(out: &mut [T], s: T, b: &[T], op: BinaryOp) {
    assert_eq!(out.len(), b.len());

    for (o, &y) in out.iter_mut().zip(b) {
        *o = T::apply(op, s, y);
    }
}

#[inline(always)]
fn zip_with<T: Copy>(out: &mut [T], a: &[T], b: &[T], f: impl Fn(T, T) -> T) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = f(x, y);
    }
}

/// out[i] = a[i] op b[i], sharded above the threshold
pub fn binary_sharded<T: Arith>(
    out: &mut [T],
    a: &[T],
    b: &[T],
    op: BinaryOp,
    parallel_threshold: usize,
) {
    assert_eq!(out.len(), a.len());
    assert_eq!(out.len(), b.len());

    shard(out, parallel_threshold, |offset, chunk| {
        let end = offset + chunk.len();
        binary_no_alloc(chunk, &a[offset..end], &b[offset..end], op);
    });
}

/// Naive multiply-then-add: `tmp = a * b` (pass 1), `out = tmp + c` (pass 2).
///
/// Six memory touches per element: read a, b, write tmp, read tmp, c,
/// write out. Allocates the intermediate.
pub fn fma_naive<T: Arith>(out: &mut [T], a: &[T], b: &[T], c: &[T]) {
    let mut tmp = vec![T::default(); a.len()];
    binary_no_alloc(&mut tmp, a, b, BinaryOp::Mul);
    binary_no_alloc(out, &tmp, c, BinaryOp::Add);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_int32_wraps() {
        let a = vec![i32::MAX, 5, -3];
        let b = vec![1, 7, 4];
        let mut out = vec![0; 3];

        binary_no_alloc(&mut out, &a, &b, BinaryOp::Add);
        assert_eq!(out, vec![i32::MIN, 12, 1]);

        binary_no_alloc(&mut out, &a, &b, BinaryOp::Sub);
        assert_eq!(out, vec![i32::MAX - 1, -2, -7]);

        binary_no_alloc(&mut out, &a, &b, BinaryOp::Mul);
        assert_eq!(out, vec![i32::MAX, 35, -12]);
    }

    #[test]
    fn test_binary_f32() {
        let a = vec![1.5_f32, 2.0, -0.5];
        let b = vec![0.5_f32, 4.0, 0.25];
        let mut out = vec![0.0; 3];

        binary_no_alloc(&mut out, &a, &b, BinaryOp::Mul);
        assert_eq!(out, vec![0.75, 8.0, -0.125]);
    }

    #[test]
    fn test_bf16_rounds_per_operator() {
        // 1 + 2^-8 is not representable; the sum rounds to 1.0 (ties to even)
        let a = vec![Bf16::ONE];
        let b = vec![Bf16::from_f32(2.0_f32.powi(-8))];
        let mut out = vec![Bf16::ZERO];

        binary_no_alloc(&mut out, &a, &b, BinaryOp::Add);
        assert_eq!(out[0], Bf16::ONE);
    }

    #[test]
    fn test_scalar_variants() {
        let a = vec![10, 20, 30];
        let mut out = vec![0; 3];

        binary_scalar_rhs(&mut out, &a, 1, BinaryOp::Sub);
        assert_eq!(out, vec![9, 19, 29]);

        binary_scalar_lhs(&mut out, 1, &a, BinaryOp::Sub);
        assert_eq!(out, vec![-9, -19, -29]);
    }

    #[test]
    fn test_fma_naive() {
        let a = vec![1.0_f32, 2.0, 3.0];
        let b = vec![4.0_f32, 5.0, 6.0];
        let c = vec![0.5_f32, 0.5, 0.5];
        let mut out = vec![0.0; 3];

        fma_naive(&mut out, &a, &b, &c);
        assert_eq!(out, vec![4.5, 10.5, 18.5]);
    }

    #[test]
    fn test_sharded_matches_sequential() {
        let n = SHARD_ELEMS * 3 + 17;
        let a: Vec<f32> = (0..n).map(|i| i as f32 * 0.37).collect();
        let b: Vec<f32> = (0..n).map(|i| 1.0 / (i as f32 + 1.0)).collect();

        let mut seq = vec![0.0; n];
        let mut par = vec![0.0; n];
        binary_sharded(&mut seq, &a, &b, BinaryOp::Mul, 0);
        binary_sharded(&mut par, &a, &b, BinaryOp::Mul, 1);

        assert!(seq.iter().zip(&par).all(|(x, y)| x.to_bits() == y.to_bits()));
    }
}
