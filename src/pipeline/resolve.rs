//! Name resolution and type checking
//!
//! Binds every leaf of a parsed `Expr` against a column source, then checks
//! that all operands share one representation and all columns one length.
//! Errors are reported in a fixed order: unknown names first (left to right),
//! then representation, then length.

use super::ir::{Expr, TypedExpr};
use crate::error::{Error, Result};
use crate::table::{Column, Repr, Scalar};

/// Where evaluation looks up names
pub trait ColumnSource {
    fn lookup(&self, name: &str) -> Option<&Column>;

    /// Representation given to untyped literals
    fn default_repr(&self) -> Repr;
}

/// Summary of a resolved expression
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub repr: Repr,
    pub len: usize,
}

/// Resolve names, then check representation and length.
pub fn resolve<'a, S: ColumnSource>(expr: &'a Expr, source: &'a S) -> Result<(TypedExpr<'a>, Shape)> {
    if let Some(missing) = expr
        .column_names()
        .into_iter()
        .find(|name| source.lookup(name).is_none())
    {
        return Err(Error::UnknownColumn(missing.to_string()));
    }

    let typed = bind(expr, source)?;

    let mut leaves = Vec::new();
    collect_leaves(&typed, &mut leaves);

    let mut repr: Option<Repr> = None;
    for leaf in &leaves {
        let leaf_repr = match leaf {
            Leaf::Column(c) => c.repr(),
            Leaf::Scalar(s) => s.repr(),
        };
        match repr {
            None => repr = Some(leaf_repr),
            Some(first) if first != leaf_repr => {
                return Err(Error::TypeMismatch {
                    left: first,
                    right: leaf_repr,
                });
            }
            Some(_) => {}
        }
    }

    let mut len: Option<usize> = None;
    for leaf in &leaves {
        let Leaf::Column(c) = leaf else { continue };
        match len {
            None => len = Some(c.len()),
            Some(first) if first != c.len() => {
                return Err(Error::LengthMismatch {
                    left: first,
                    right: c.len(),
                });
            }
            Some(_) => {}
        }
    }

    match (repr, len) {
        (Some(repr), Some(len)) => Ok((typed, Shape { repr, len })),
        _ => Err(Error::NoColumnOperand),
    }
}

fn bind<'a, S: ColumnSource>(expr: &'a Expr, source: &'a S) -> Result<TypedExpr<'a>> {
    Ok(match expr {
        Expr::Column(name) => TypedExpr::Column {
            name,
            column: source
                .lookup(name)
                .ok_or_else(|| Error::UnknownColumn(name.clone()))?,
        },
        Expr::Literal { value, repr } => {
            let repr = repr.unwrap_or_else(|| source.default_repr());
            TypedExpr::Scalar(Scalar::convert(repr, *value))
        }
        Expr::Binary { op, lhs, rhs } => TypedExpr::binary(*op, bind(lhs, source)?, bind(rhs, source)?),
    })
}

enum Leaf<'a> {
    Column(&'a Column),
    Scalar(Scalar),
}

fn collect_leaves<'a>(expr: &TypedExpr<'a>, out: &mut Vec<Leaf<'a>>) {
    match expr {
        TypedExpr::Column { column, .. } => out.push(Leaf::Column(*column)),
        TypedExpr::Scalar(s) => out.push(Leaf::Scalar(*s)),
        TypedExpr::Binary { lhs, rhs, .. } => {
            collect_leaves(lhs, out);
            collect_leaves(rhs, out);
        }
    }
}
