//! Expression parser
//!
//! Precedence climbing over the token stream. `*` binds tighter than `+`
//! and `-`; all three are left-associative. A leading `-` is only accepted
//! directly in front of a numeric literal.
//!
//! Every later stage recurses over the tree, so the parser bounds both the
//! tree depth and parenthesis nesting.

use super::ir::Expr;
use super::lexer::{Lexer, Token, TokenKind};
use crate::builtins::BinaryOp;
use crate::error::{Error, Result};

/// Operator precedence.
type Precedence = u8;

fn infix(kind: &TokenKind) -> Option<(BinaryOp, Precedence)> {
    match kind {
        TokenKind::Plus => Some((BinaryOp::Add, 1)),
        TokenKind::Minus => Some((BinaryOp::Sub, 1)),
        TokenKind::Star => Some((BinaryOp::Mul, 2)),
        _ => None,
    }
}

/// Depth limit used by `parse`
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parse expression text into an unresolved tree
pub fn parse(input: &str) -> Result<Expr> {
    parse_with_depth(input, DEFAULT_MAX_DEPTH)
}

/// Parse, rejecting trees deeper than `max_depth` levels
pub fn parse_with_depth(input: &str, max_depth: usize) -> Result<Expr> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        max_depth,
        nesting: 0,
    };
    let (expr, _) = parser.parse_expression(0)?;

    let trailing = parser.peek();
    match &trailing.kind {
        TokenKind::End => Ok(expr),
        TokenKind::RParen => Err(Error::parse(trailing.pos, "unbalanced ')'")),
        TokenKind::Unsupported(op) => Err(unsupported(*op, trailing.pos)),
        other => Err(Error::parse(
            trailing.pos,
            format!("expected operator, found {}", describe(other)),
        )),
    }
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    max_depth: usize,
    /// Open parentheses around the cursor
    nesting: usize,
}

fn too_deep(pos: usize, max_depth: usize) -> Error {
    Error::parse(pos, format!("expression nests deeper than {max_depth} levels"))
}

impl Parser {
    fn peek(&self) -> &Token {
        // `tokenize` always ends with End, and End is never consumed
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::End {
            self.cursor += 1;
        }
        token
    }

    /// Returns the subtree and its depth (a leaf is 1)
    fn parse_expression(&mut self, min_precedence: Precedence) -> Result<(Expr, usize)> {
        let (mut lhs, mut depth) = self.parse_primary()?;

        loop {
            let token = self.peek();
            if let TokenKind::Unsupported(op) = token.kind {
                return Err(unsupported(op, token.pos));
            }
            let Some((op, precedence)) = infix(&token.kind) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            let op_pos = self.advance().pos;
            // Left-associative: the right side only takes tighter operators
            let (rhs, rhs_depth) = self.parse_expression(precedence + 1)?;
            depth = depth.max(rhs_depth) + 1;
            if depth > self.max_depth {
                return Err(too_deep(op_pos, self.max_depth));
            }
            lhs = Expr::binary(op, lhs, rhs);
        }

        Ok((lhs, depth))
    }

    fn parse_primary(&mut self) -> Result<(Expr, usize)> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) => Ok((Expr::Column(name), 1)),
            TokenKind::Number { value, repr } => Ok((Expr::Literal { value, repr }, 1)),
            TokenKind::Minus => {
                let next = self.advance();
                match next.kind {
                    TokenKind::Number { value, repr } => Ok((Expr::Literal { value: -value, repr }, 1)),
                    _ => Err(Error::parse(
                        token.pos,
                        "negation is only supported on numeric literals",
                    )),
                }
            }
            TokenKind::LParen => {
                if self.nesting >= self.max_depth {
                    return Err(too_deep(token.pos, self.max_depth));
                }
                self.nesting += 1;
                let inner = self.parse_expression(0)?;
                self.nesting -= 1;
                let close = self.advance();
                match close.kind {
                    TokenKind::RParen => Ok(inner),
                    TokenKind::End => Err(Error::parse(token.pos, "unclosed '('")),
                    other => Err(Error::parse(
                        close.pos,
                        format!("expected ')', found {}", describe(&other)),
                    )),
                }
            }
            TokenKind::End => Err(Error::parse(token.pos, "unexpected end of expression")),
            TokenKind::Unsupported(op) => Err(unsupported(op, token.pos)),
            other => Err(Error::parse(
                token.pos,
                format!("expected operand, found {}", describe(&other)),
            )),
        }
    }
}

fn unsupported(op: char, pos: usize) -> Error {
    Error::parse(pos, format!("unsupported operator '{op}'"))
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("identifier {name:?}"),
        TokenKind::Number { value, .. } => format!("number {value}"),
        TokenKind::Plus => "'+'".to_string(),
        TokenKind::Minus => "'-'".to_string(),
        TokenKind::Star => "'*'".to_string(),
        TokenKind::Unsupported(op) => format!("'{op}'"),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::End => "end of expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Repr;

    fn col(name: &str) -> Expr {
        Expr::column(name)
    }

    fn parse_err_pos(input: &str) -> usize {
        match parse(input) {
            Err(Error::Parse { position, .. }) => position,
            other => panic!("expected parse error for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(parse("  a ").unwrap(), col("a"));
    }

    #[test]
    fn test_precedence() {
        let expected = Expr::binary(
            BinaryOp::Add,
            Expr::binary(BinaryOp::Mul, col("a"), col("b")),
            col("c"),
        );
        assert_eq!(parse("a*b+c").unwrap(), expected);

        let expected = Expr::binary(
            BinaryOp::Add,
            col("c"),
            Expr::binary(BinaryOp::Mul, col("a"), col("b")),
        );
        assert_eq!(parse("c + a * b").unwrap(), expected);
    }

    #[test]
    fn test_left_associative() {
        let expected = Expr::binary(
            BinaryOp::Sub,
            Expr::binary(BinaryOp::Sub, col("a"), col("b")),
            col("c"),
        );
        assert_eq!(parse("a - b - c").unwrap(), expected);
    }

    #[test]
    fn test_parentheses() {
        let expected = Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Add, col("a"), col("b")),
            col("c"),
        );
        assert_eq!(parse("(a + b) * c").unwrap(), expected);
        assert_eq!(parse("((a))").unwrap(), col("a"));
    }

    #[test]
    fn test_literals() {
        let expected = Expr::binary(
            BinaryOp::Mul,
            col("x"),
            Expr::Literal {
                value: -2.5,
                repr: Some(Repr::Float32),
            },
        );
        assert_eq!(parse("x * -2.5_f32").unwrap(), expected);
        assert_eq!(parse("3").unwrap(), Expr::literal(3.0));
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(parse_err_pos("(a + b"), 0);
        assert_eq!(parse_err_pos("a + b)"), 5);
        assert_eq!(parse_err_pos("()"), 1);
    }

    #[test]
    fn test_unsupported_operators() {
        for input in ["a / b", "a & b", "a | b", "a ^ b", "a % b"] {
            assert_eq!(parse_err_pos(input), 2, "{input}");
        }
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let nested = format!("{}a{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(parse_err_pos(&nested), DEFAULT_MAX_DEPTH);

        let at_limit = format!("{}a{}", "(".repeat(DEFAULT_MAX_DEPTH), ")".repeat(DEFAULT_MAX_DEPTH));
        assert_eq!(parse(&at_limit).unwrap(), col("a"));
    }

    #[test]
    fn test_long_chain_rejected() {
        let chain = vec!["a"; 200_000].join("+");
        assert!(matches!(parse(&chain), Err(Error::Parse { .. })));

        // 4 operands, depth 4
        assert!(parse_with_depth("a + b * c - d", 3).is_err());
        assert!(parse_with_depth("a + b * c - d", 4).is_ok());
        assert!(parse_with_depth("(((a)))", 2).is_err());
    }

    #[test]
    fn test_malformed() {
        assert_eq!(parse_err_pos(""), 0);
        assert_eq!(parse_err_pos("a +"), 3);
        assert_eq!(parse_err_pos("a b"), 2);
        assert_eq!(parse_err_pos("* a"), 0);
        assert_eq!(parse_err_pos("-a"), 0);
    }
}
