//! Fused kernels for multi-op patterns
//!
//! These kernels eliminate intermediate passes by computing the whole
//! chain in a single memory pass.

use super::kernels::{shard, Arith};

// ===========================================================================
// MUL_ADD: a * b + c
// ===========================================================================
// Pattern: out = a * b + c
// Eliminates: materialized a*b vector, second read of it
// Traffic: 3 reads + 1 write per element (naive: 4 reads + 2 writes)

/// Fused multiply-add over four equal-length buffers.
///
/// Computes: out[i] = a[i] * b[i] + c[i], rounding after the multiply
/// exactly as the two-pass chain does.
pub fn mul_add_no_alloc<T: Arith>(out: &mut [T], a: &[T], b: &[T], c: &[T]) {
    let n = out.len();
    assert_eq!(a.len(), n);
    assert_eq!(b.len(), n);
    assert_eq!(c.len(), n);

    unsafe {
        let ap = a.as_ptr();
        let bp = b.as_ptr();
        let cp = c.as_ptr();
        let op = out.as_mut_ptr();

        for i in 0..n {
            *op.add(i) = Arith::mul_add(*ap.add(i), *bp.add(i), *cp.add(i));
        }
    }
}

/// Fused multiply-add, sharded above `parallel_threshold` elements
pub fn mul_add_sharded<T: Arith>(
    out: &mut [T],
    a: &[T],
    b: &[T],
    c: &[T],
    parallel_threshold: usize,
) {
    let n = out.len();
    assert_eq!(a.len(), n);
    assert_eq!(b.len(), n);
    assert_eq!(c.len(), n);

    shard(out, parallel_threshold, |offset, chunk| {
        let end = offset + chunk.len();
        mul_add_no_alloc(chunk, &a[offset..end], &b[offset..end], &c[offset..end]);
    });
}
