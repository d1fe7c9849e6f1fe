//! Expression evaluation
//!
//! This module turns expression text into a new column:
//!
//! 1. **Lexer / parser**: text into an unresolved `Expr` tree
//! 2. **Resolve**: bind names against a `ColumnSource`, check representation and length
//! 3. **Optimizer**: fold literal subtrees, drop exact identities
//! 4. **Planner**: pick fused or naive kernels per node
//! 5. **Executor**: run the plan, one output allocation per pass
//!
//! ## Architecture
//!
//! ```text
//! "a * b + c * 1"
//!     ↓
//! Expr: Add(Mul(a, b), Mul(c, 1))
//!     ↓
//! TypedExpr: Add(Mul(&a, &b), &c)
//!     ↓
//! ExecutionPlan: FusedMulAdd(a, b, c)   (or Naive(+, Naive(*, a, b), c))
//!     ↓
//! Column
//! ```
//!
//! Nothing is allocated before resolution succeeds, so a rejected expression
//! leaves no trace. Tree depth is capped by `EngineConfig::max_expression_depth`
//! at parse time, which bounds the recursion of every later stage.

pub mod ir;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod optimizer;
pub mod execution_plan;
pub mod planner;
pub mod executor;

pub use ir::{Expr, TypedExpr};
pub use parser::{parse, parse_with_depth};
pub use resolve::{resolve, ColumnSource, Shape};
pub use execution_plan::{CacheTier, ExecutionPlan, FusionEstimate, Step};
pub use planner::{FusionAnalyzer, Planner};
pub use executor::{ExecutionStats, Executor};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::table::Column;

/// Evaluate expression text against `source`
pub fn evaluate<S: ColumnSource>(source: &S, config: &EngineConfig, text: &str) -> Result<Column> {
    evaluate_with_stats(source, config, text).map(|(column, _)| column)
}

/// Evaluate and report what the executor did
pub fn evaluate_with_stats<S: ColumnSource>(
    source: &S,
    config: &EngineConfig,
    text: &str,
) -> Result<(Column, ExecutionStats)> {
    let expr = parse_with_depth(text, config.max_expression_depth)?;
    let (typed, shape) = resolve(&expr, source)?;
    let plan = Planner::new(config).plan(optimizer::optimize(typed), shape);

    tracing::debug!(
        expression = text,
        repr = %plan.repr,
        len = plan.len,
        fused = plan.fused_steps(),
        naive = plan.naive_steps(),
        "evaluating"
    );

    let mut executor = Executor::new(config.parallel_threshold);
    let column = executor.execute(&plan)?;
    Ok((column, executor.stats().clone()))
}

/// Plan without executing; one line per step
pub fn explain<S: ColumnSource>(source: &S, config: &EngineConfig, text: &str) -> Result<String> {
    let expr = parse_with_depth(text, config.max_expression_depth)?;
    let (typed, shape) = resolve(&expr, source)?;
    Ok(Planner::new(config).plan(optimizer::optimize(typed), shape).explain())
}
