//! Expression planner
//!
//! Converts a resolved, optimized expression into an ExecutionPlan by:
//! 1. Matching multiply-then-add over three column operands (`a*b + c`,
//!    `c + a*b`) at any node
//! 2. Asking the fusion analyzer whether a single pass pays off
//! 3. Lowering everything else to one naive pass per operator

use super::execution_plan::{CacheTier, ExecutionPlan, FusionEstimate, Step};
use super::ir::TypedExpr;
use super::resolve::Shape;
use crate::builtins::BinaryOp;
use crate::config::{EngineConfig, FusionPolicy};
use crate::table::{Column, Repr};

/// Per-element touches of the two-pass chain: each pass reads two, writes one
const NAIVE_TOUCHES: u32 = 6;

/// Input columns of a multiply-add
const FUSED_INPUTS: u32 = 3;

/// Cost model for fusing `a * b + c`
#[derive(Clone, Copy, Debug)]
pub struct FusionAnalyzer {
    l1_bytes: usize,
    l2_bytes: usize,
    l3_bytes: usize,
}

impl FusionAnalyzer {
    pub fn new(config: &EngineConfig) -> Self {
        FusionAnalyzer {
            l1_bytes: config.l1_bytes,
            l2_bytes: config.l2_bytes,
            l3_bytes: config.l3_bytes,
        }
    }

    /// Smallest cache level that holds `bytes`
    pub fn tier(&self, bytes: usize) -> CacheTier {
        if bytes <= self.l1_bytes {
            CacheTier::L1
        } else if bytes <= self.l2_bytes {
            CacheTier::L2
        } else if bytes <= self.l3_bytes {
            CacheTier::L3
        } else {
            CacheTier::Dram
        }
    }

    /// Estimate the speedup of one fused pass over the naive chain.
    ///
    /// The traffic ratio is the upper bound. It is damped by how memory-bound
    /// the working set is (its tier) and by per-element conversion cost.
    pub fn estimate(&self, repr: Repr, len: usize) -> FusionEstimate {
        let fused_touches = FUSED_INPUTS + 1;
        let working_set_bytes = (fused_touches as usize)
            .saturating_mul(len)
            .saturating_mul(repr.width());
        let tier = self.tier(working_set_bytes);

        let ratio = f64::from(NAIVE_TOUCHES) / f64::from(fused_touches);
        let speedup = 1.0 + (ratio - 1.0) * tier_weight(tier) * repr_factor(repr);

        FusionEstimate {
            working_set_bytes,
            tier,
            naive_touches: NAIVE_TOUCHES,
            fused_touches,
            speedup,
        }
    }
}

fn tier_weight(tier: CacheTier) -> f64 {
    match tier {
        CacheTier::L1 => 0.1,
        CacheTier::L2 => 0.6,
        CacheTier::L3 => 0.8,
        CacheTier::Dram => 0.85,
    }
}

fn repr_factor(repr: Repr) -> f64 {
    match repr {
        // Widen/round per element makes the loop more compute-bound
        Repr::BFloat16 => 0.75,
        Repr::Int32 | Repr::Float32 => 1.0,
    }
}

/// Expression planner
pub struct Planner {
    analyzer: FusionAnalyzer,
    policy: FusionPolicy,
    min_speedup: f64,
}

impl Planner {
    pub fn new(config: &EngineConfig) -> Self {
        Planner {
            analyzer: FusionAnalyzer::new(config),
            policy: config.fusion,
            min_speedup: config.min_fusion_speedup,
        }
    }

    /// Plan a resolved expression
    pub fn plan<'a>(&self, expr: TypedExpr<'a>, shape: Shape) -> ExecutionPlan<'a> {
        ExecutionPlan {
            root: self.lower(expr, shape),
            repr: shape.repr,
            len: shape.len,
        }
    }

    fn lower<'a>(&self, expr: TypedExpr<'a>, shape: Shape) -> Step<'a> {
        match expr {
            TypedExpr::Column { name, column } => Step::Load { name, column },
            TypedExpr::Scalar(s) => Step::Scalar(s),
            TypedExpr::Binary { op, lhs, rhs } => {
                if let Some((a, b, c)) = match_mul_add(op, &lhs, &rhs) {
                    if let Some(estimate) = self.decide(shape) {
                        return Step::FusedMulAdd { a, b, c, estimate };
                    }
                }
                Step::Naive {
                    op,
                    lhs: Box::new(self.lower(*lhs, shape)),
                    rhs: Box::new(self.lower(*rhs, shape)),
                }
            }
        }
    }

    /// Some(estimate) when the candidate should run fused
    fn decide(&self, shape: Shape) -> Option<FusionEstimate> {
        let estimate = self.analyzer.estimate(shape.repr, shape.len);
        let fuse = match self.policy {
            FusionPolicy::Always => true,
            FusionPolicy::Never => false,
            FusionPolicy::Auto => estimate.speedup >= self.min_speedup,
        };
        tracing::debug!(
            repr = %shape.repr,
            len = shape.len,
            working_set = estimate.working_set_bytes,
            tier = ?estimate.tier,
            speedup = estimate.speedup,
            policy = ?self.policy,
            fuse,
            "fusion candidate"
        );
        fuse.then_some(estimate)
    }
}

/// Columns (a, b, c) of `a*b + c` or `c + a*b`
fn match_mul_add<'a>(
    op: BinaryOp,
    lhs: &TypedExpr<'a>,
    rhs: &TypedExpr<'a>,
) -> Option<(&'a Column, &'a Column, &'a Column)> {
    if op != BinaryOp::Add {
        return None;
    }
    let product = |e: &TypedExpr<'a>| match e {
        TypedExpr::Binary {
            op: BinaryOp::Mul,
            lhs,
            rhs,
        } => Some((lhs.as_column()?, rhs.as_column()?)),
        _ => None,
    };

    if let (Some((a, b)), Some(c)) = (product(lhs), rhs.as_column()) {
        return Some((a, b, c));
    }
    if let (Some(c), Some((a, b))) = (lhs.as_column(), product(rhs)) {
        return Some((a, b, c));
    }
    None
}
