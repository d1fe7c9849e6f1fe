//! Plan executor
//!
//! Walks an ExecutionPlan bottom-up. Registered columns are read in place;
//! every pass writes a fresh intermediate that is dropped as soon as its
//! parent consumes it.

use super::execution_plan::{ExecutionPlan, Step};
use super::optimizer::fold;
use crate::builtins::ops::{binary_column, binary_column_scalar, broadcast, mul_add_fused};
use crate::builtins::BinaryOp;
use crate::error::{Error, Result};
use crate::table::{Column, Scalar};

/// Execution statistics for performance measurement
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Kernel passes over the data
    pub passes: usize,

    /// Passes that ran the fused multiply-add
    pub fused: usize,

    /// Passes that ran one operator
    pub naive: usize,

    /// Column allocations, result included
    pub allocations: usize,
}

/// Plan executor
pub struct Executor {
    parallel_threshold: usize,
    stats: ExecutionStats,
}

/// Intermediate value: borrowed input, owned result, or broadcast scalar
enum Value<'a> {
    Borrowed(&'a Column),
    Owned(Column),
    Scalar(Scalar),
}

impl<'a> Value<'a> {
    fn column(&self) -> Option<&Column> {
        match self {
            Value::Borrowed(c) => Some(c),
            Value::Owned(c) => Some(c),
            Value::Scalar(_) => None,
        }
    }
}

impl Executor {
    pub fn new(parallel_threshold: usize) -> Self {
        Executor {
            parallel_threshold,
            stats: ExecutionStats::default(),
        }
    }

    /// Execute a plan, returning a new caller-owned column
    pub fn execute(&mut self, plan: &ExecutionPlan<'_>) -> Result<Column> {
        match self.eval(&plan.root)? {
            Value::Owned(column) => Ok(column),
            Value::Borrowed(column) => {
                // Bare name: value copy
                self.stats.allocations += 1;
                Ok(column.clone())
            }
            Value::Scalar(s) => {
                self.stats.allocations += 1;
                broadcast(s, plan.len)
            }
        }
    }

    fn eval<'a>(&mut self, step: &Step<'a>) -> Result<Value<'a>> {
        match step {
            Step::Load { column, .. } => Ok(Value::Borrowed(*column)),
            Step::Scalar(s) => Ok(Value::Scalar(*s)),
            Step::FusedMulAdd { a, b, c, .. } => {
                let out = mul_add_fused(a, b, c, self.parallel_threshold)?;
                self.record(true);
                Ok(Value::Owned(out))
            }
            Step::Naive { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.naive(*op, &lhs, &rhs)
            }
        }
    }

    fn naive<'a>(&mut self, op: BinaryOp, lhs: &Value<'a>, rhs: &Value<'a>) -> Result<Value<'a>> {
        let threshold = self.parallel_threshold;
        let out = match (lhs.column(), rhs.column(), lhs, rhs) {
            (Some(a), Some(b), _, _) => binary_column(a, b, op, threshold)?,
            (Some(a), None, _, Value::Scalar(s)) => binary_column_scalar(a, *s, op, false, threshold)?,
            (None, Some(b), Value::Scalar(s), _) => binary_column_scalar(b, *s, op, true, threshold)?,
            (_, _, Value::Scalar(a), Value::Scalar(b)) => {
                return fold(op, *a, *b).map(Value::Scalar).ok_or(Error::TypeMismatch {
                    left: a.repr(),
                    right: b.repr(),
                });
            }
            _ => return Err(Error::NoColumnOperand),
        };
        self.record(false);
        Ok(Value::Owned(out))
    }

    fn record(&mut self, fused: bool) {
        self.stats.passes += 1;
        self.stats.allocations += 1;
        if fused {
            self.stats.fused += 1;
        } else {
            self.stats.naive += 1;
        }
    }

    /// Get execution statistics
    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }
}
