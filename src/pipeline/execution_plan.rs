//! Kernel plan
//!
//! A tree of steps derived from a resolved expression. Each internal step is
//! either one naive kernel pass or one fused multiply-add pass. Plans borrow
//! the registry's columns and live for a single evaluation.

use crate::builtins::BinaryOp;
use crate::table::{Column, Repr, Scalar};

/// Cache level that holds a working set
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CacheTier {
    L1,
    L2,
    L3,
    Dram,
}

/// Profitability estimate for one fusion candidate
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusionEstimate {
    /// Operand + result bytes touched by the fused pass
    pub working_set_bytes: usize,
    pub tier: CacheTier,
    /// Memory touches per element, two-pass chain
    pub naive_touches: u32,
    /// Memory touches per element, single pass
    pub fused_touches: u32,
    pub speedup: f64,
}

#[derive(Clone, Debug)]
pub enum Step<'a> {
    /// Registered column, read in place
    Load { name: &'a str, column: &'a Column },

    /// Broadcast operand of a binary step
    Scalar(Scalar),

    /// One pass per operator; materializes its result
    Naive {
        op: BinaryOp,
        lhs: Box<Step<'a>>,
        rhs: Box<Step<'a>>,
    },

    /// a * b + c in one pass
    FusedMulAdd {
        a: &'a Column,
        b: &'a Column,
        c: &'a Column,
        estimate: FusionEstimate,
    },
}

#[derive(Clone, Debug)]
pub struct ExecutionPlan<'a> {
    pub root: Step<'a>,
    pub repr: Repr,
    pub len: usize,
}

impl<'a> ExecutionPlan<'a> {
    /// Number of fused passes in the plan
    pub fn fused_steps(&self) -> usize {
        count(&self.root, &|s| matches!(s, Step::FusedMulAdd { .. }))
    }

    /// Number of naive passes in the plan
    pub fn naive_steps(&self) -> usize {
        count(&self.root, &|s| matches!(s, Step::Naive { .. }))
    }

    /// Root is a bare column (evaluates to a copy)
    pub fn is_copy(&self) -> bool {
        matches!(self.root, Step::Load { .. })
    }

    /// Human-readable plan, one step per line
    pub fn explain(&self) -> String {
        let mut out = String::new();
        explain_step(&self.root, 0, &mut out);
        out
    }
}

fn count(step: &Step<'_>, pred: &dyn Fn(&Step<'_>) -> bool) -> usize {
    let own = usize::from(pred(step));
    match step {
        Step::Naive { lhs, rhs, .. } => own + count(lhs, pred) + count(rhs, pred),
        _ => own,
    }
}

fn explain_step(step: &Step<'_>, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match step {
        Step::Load { name, .. } => out.push_str(&format!("{indent}load {name}\n")),
        Step::Scalar(s) => out.push_str(&format!("{indent}scalar {s}\n")),
        Step::Naive { op, lhs, rhs } => {
            out.push_str(&format!("{indent}naive {}\n", op.symbol()));
            explain_step(lhs, depth + 1, out);
            explain_step(rhs, depth + 1, out);
        }
        Step::FusedMulAdd { estimate, .. } => out.push_str(&format!(
            "{indent}fused mul_add tier={:?} speedup={:.2}\n",
            estimate.tier, estimate.speedup
        )),
    }
}
