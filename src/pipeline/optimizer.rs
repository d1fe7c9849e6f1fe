//! Tree rewrites applied after resolution
//!
//! Only rewrites that are exact for the operand representation:
//! - literal-only subtrees fold to one scalar (same kernels semantics)
//! - `x * 1`, `1 * x`, `x - 0` drop the operator
//! - `x + 0`, `0 + x` drop the operator for int32 only (float `-0.0 + 0.0`
//!   is `+0.0`)

use super::ir::TypedExpr;
use crate::builtins::{Arith, BinaryOp};
use crate::table::{Repr, Scalar};

pub fn optimize(expr: TypedExpr<'_>) -> TypedExpr<'_> {
    match expr {
        TypedExpr::Binary { op, lhs, rhs } => {
            let lhs = optimize(*lhs);
            let rhs = optimize(*rhs);

            if let (Some(a), Some(b)) = (lhs.as_scalar(), rhs.as_scalar()) {
                if let Some(folded) = fold(op, a, b) {
                    return TypedExpr::Scalar(folded);
                }
            }

            match (op, lhs.as_scalar(), rhs.as_scalar()) {
                (BinaryOp::Mul, _, Some(s)) if s.is_one() => lhs,
                (BinaryOp::Mul, Some(s), _) if s.is_one() => rhs,
                (BinaryOp::Sub, _, Some(s)) if s.is_zero() && is_positive_zero(s) => lhs,
                (BinaryOp::Add, _, Some(s)) if s.is_zero() && s.repr() == Repr::Int32 => lhs,
                (BinaryOp::Add, Some(s), _) if s.is_zero() && s.repr() == Repr::Int32 => rhs,
                _ => TypedExpr::binary(op, lhs, rhs),
            }
        }
        leaf => leaf,
    }
}

/// `x - (+0.0)` is exact; `x - (-0.0)` maps -0.0 to +0.0
fn is_positive_zero(s: Scalar) -> bool {
    s.to_f64().is_sign_positive()
}

/// Scalar op scalar with kernel semantics; None on mixed representations
pub fn fold(op: BinaryOp, a: Scalar, b: Scalar) -> Option<Scalar> {
    Some(match (a, b) {
        (Scalar::Int32(x), Scalar::Int32(y)) => Scalar::Int32(Arith::apply(op, x, y)),
        (Scalar::Float32(x), Scalar::Float32(y)) => Scalar::Float32(Arith::apply(op, x, y)),
        (Scalar::BFloat16(x), Scalar::BFloat16(y)) => Scalar::BFloat16(Arith::apply(op, x, y)),
        _ => return None,
    })
}
