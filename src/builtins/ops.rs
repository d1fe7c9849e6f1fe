//! Column-level operations
//!
//! Dispatch from the closed `Column` enum to the monomorphic kernels.
//! Every operation checks representation and length first and allocates a
//! fresh output column; inputs are never mutated.

use crate::builtins::kernels::{
    binary_scalar_lhs, binary_scalar_rhs, binary_sharded, shard, Arith, BinaryOp,
};
use crate::builtins::kernels_fused::mul_add_sharded;
use crate::error::{Error, Result};
use crate::table::column::output_vec;
use crate::table::{Column, Repr, Scalar};

/// a op b, elementwise
pub fn binary_column(a: &Column, b: &Column, op: BinaryOp, parallel_threshold: usize) -> Result<Column> {
    a.check_compatible(b)?;
    tracing::trace!(op = %op.symbol(), len = a.len(), repr = %a.repr(), "naive binary pass");

    let n = a.len();
    Ok(match (a, b) {
        (Column::Int32(x), Column::Int32(y)) => {
            let mut out = output_vec(Repr::Int32, n)?;
            binary_sharded(&mut out, x, y, op, parallel_threshold);
            Column::Int32(out)
        }
        (Column::Float32(x), Column::Float32(y)) => {
            let mut out = output_vec(Repr::Float32, n)?;
            binary_sharded(&mut out, x, y, op, parallel_threshold);
            Column::Float32(out)
        }
        (Column::BFloat16(x), Column::BFloat16(y)) => {
            let mut out = output_vec(Repr::BFloat16, n)?;
            binary_sharded(&mut out, x, y, op, parallel_threshold);
            Column::BFloat16(out)
        }
        _ => unreachable!("check_compatible guarantees matching representations"),
    })
}

/// Column op scalar (`scalar_on_left` flips to scalar op column)
pub fn binary_column_scalar(
    col: &Column,
    scalar: Scalar,
    op: BinaryOp,
    scalar_on_left: bool,
    parallel_threshold: usize,
) -> Result<Column> {
    if col.repr() != scalar.repr() {
        let (left, right) = if scalar_on_left {
            (scalar.repr(), col.repr())
        } else {
            (col.repr(), scalar.repr())
        };
        return Err(Error::TypeMismatch { left, right });
    }
    tracing::trace!(op = %op.symbol(), len = col.len(), %scalar, "naive scalar pass");

    let n = col.len();
    Ok(match (col, scalar) {
        (Column::Int32(x), Scalar::Int32(s)) => {
            Column::Int32(scalar_pass(Repr::Int32, x, s, op, scalar_on_left, parallel_threshold)?)
        }
        (Column::Float32(x), Scalar::Float32(s)) => {
            Column::Float32(scalar_pass(Repr::Float32, x, s, op, scalar_on_left, parallel_threshold)?)
        }
        (Column::BFloat16(x), Scalar::BFloat16(s)) => Column::BFloat16(scalar_pass(
            Repr::BFloat16,
            x,
            s,
            op,
            scalar_on_left,
            parallel_threshold,
        )?),
        _ => unreachable!("representations checked above, len {n}"),
    })
}

fn scalar_pass<T: Arith>(
    repr: Repr,
    x: &[T],
    s: T,
    op: BinaryOp,
    scalar_on_left: bool,
    parallel_threshold: usize,
) -> Result<Vec<T>> {
    let mut out = output_vec(repr, x.len())?;
    shard(&mut out, parallel_threshold, |offset, chunk| {
        let src = &x[offset..offset + chunk.len()];
        if scalar_on_left {
            binary_scalar_lhs(chunk, s, src, op);
        } else {
            binary_scalar_rhs(chunk, src, s, op);
        }
    });
    Ok(out)
}

/// Fused a * b + c in a single pass
pub fn mul_add_fused(a: &Column, b: &Column, c: &Column, parallel_threshold: usize) -> Result<Column> {
    a.check_compatible(b)?;
    a.check_compatible(c)?;
    tracing::trace!(len = a.len(), repr = %a.repr(), "fused mul_add pass");

    let n = a.len();
    Ok(match (a, b, c) {
        (Column::Int32(x), Column::Int32(y), Column::Int32(z)) => {
            let mut out = output_vec(Repr::Int32, n)?;
            mul_add_sharded(&mut out, x, y, z, parallel_threshold);
            Column::Int32(out)
        }
        (Column::Float32(x), Column::Float32(y), Column::Float32(z)) => {
            let mut out = output_vec(Repr::Float32, n)?;
            mul_add_sharded(&mut out, x, y, z, parallel_threshold);
            Column::Float32(out)
        }
        (Column::BFloat16(x), Column::BFloat16(y), Column::BFloat16(z)) => {
            let mut out = output_vec(Repr::BFloat16, n)?;
            mul_add_sharded(&mut out, x, y, z, parallel_threshold);
            Column::BFloat16(out)
        }
        _ => unreachable!("check_compatible guarantees matching representations"),
    })
}

/// Naive a * b + c: materializes the product column, then adds
pub fn mul_add_naive(a: &Column, b: &Column, c: &Column, parallel_threshold: usize) -> Result<Column> {
    a.check_compatible(c)?;
    let product = binary_column(a, b, BinaryOp::Mul, parallel_threshold)?;
    binary_column(&product, c, BinaryOp::Add, parallel_threshold)
}

/// Column filled with one scalar
pub fn broadcast(scalar: Scalar, len: usize) -> Result<Column> {
    Column::create(scalar.repr(), len, scalar.to_f64())
}

// ============================================================================
// Reductions
// ============================================================================

/// sum: wraps for Int32, accumulates in the element type for floats
pub fn sum(x: &Column) -> f64 {
    match x {
        Column::Int32(data) => data.iter().fold(0_i32, |acc, &v| acc.wrapping_add(v)) as f64,
        Column::Float32(data) => data.iter().sum::<f32>() as f64,
        Column::BFloat16(data) => data
            .iter()
            .fold(crate::table::Bf16::ZERO, |acc, &v| acc.add(v))
            .to_f64(),
    }
}

/// min: NaN propagates for float columns
pub fn min(x: &Column) -> f64 {
    reduce_f64(x, f64::INFINITY, |acc, v| if v < acc || v.is_nan() { v } else { acc })
}

/// max: NaN propagates for float columns
pub fn max(x: &Column) -> f64 {
    reduce_f64(x, f64::NEG_INFINITY, |acc, v| if v > acc || v.is_nan() { v } else { acc })
}

fn reduce_f64(x: &Column, identity: f64, f: impl Fn(f64, f64) -> f64) -> f64 {
    let mut acc = identity;
    for v in x.to_f64_vec() {
        if acc.is_nan() {
            break;
        }
        acc = f(acc, v);
    }
    acc
}
