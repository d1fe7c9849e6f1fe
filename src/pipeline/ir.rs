//! Expression tree
//!
//! `Expr` is what the parser produces: names are plain strings and literals
//! may be untyped. `TypedExpr` is the same tree after resolution against a
//! registry, with every leaf bound to a column or a typed scalar.

use std::fmt;

use crate::builtins::BinaryOp;
use crate::table::{Column, Repr, Scalar};

/// Parsed, unresolved expression
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Reference to a registered column
    Column(String),

    /// Numeric literal; `repr` is set when written with a type marker
    Literal { value: f64, repr: Option<Repr> },

    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn literal(value: f64) -> Self {
        Expr::Literal { value, repr: None }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Column names in left-to-right order, duplicates included
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'e>(&'e self, names: &mut Vec<&'e str>) {
        match self {
            Expr::Column(name) => names.push(name),
            Expr::Literal { .. } => {}
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_names(names);
                rhs.collect_names(names);
            }
        }
    }

    /// Number of operator nodes
    pub fn op_count(&self) -> usize {
        match self {
            Expr::Binary { lhs, rhs, .. } => 1 + lhs.op_count() + rhs.op_count(),
            _ => 0,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => f.write_str(name),
            Expr::Literal { value, repr: None } => write!(f, "{value}"),
            Expr::Literal {
                value,
                repr: Some(repr),
            } => write!(f, "{value}_{}", repr.marker()),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

/// Expression with every leaf resolved; borrows the registry's columns
#[derive(Clone, Debug)]
pub enum TypedExpr<'a> {
    Column { name: &'a str, column: &'a Column },
    Scalar(Scalar),
    Binary {
        op: BinaryOp,
        lhs: Box<TypedExpr<'a>>,
        rhs: Box<TypedExpr<'a>>,
    },
}

impl<'a> TypedExpr<'a> {
    pub fn binary(op: BinaryOp, lhs: TypedExpr<'a>, rhs: TypedExpr<'a>) -> Self {
        TypedExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn as_column(&self) -> Option<&'a Column> {
        match self {
            TypedExpr::Column { column, .. } => Some(*column),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            TypedExpr::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    pub fn has_column(&self) -> bool {
        match self {
            TypedExpr::Column { .. } => true,
            TypedExpr::Scalar(_) => false,
            TypedExpr::Binary { lhs, rhs, .. } => lhs.has_column() || rhs.has_column(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_order() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::binary(BinaryOp::Mul, Expr::column("a"), Expr::column("b")),
            Expr::binary(BinaryOp::Sub, Expr::literal(1.0), Expr::column("a")),
        );
        assert_eq!(expr.column_names(), vec!["a", "b", "a"]);
        assert_eq!(expr.op_count(), 3);
    }

    #[test]
    fn test_display() {
        let expr = Expr::binary(
            BinaryOp::Mul,
            Expr::column("x"),
            Expr::Literal {
                value: 2.0,
                repr: Some(Repr::BFloat16),
            },
        );
        assert_eq!(expr.to_string(), "(x * 2_bf16)");
    }
}
