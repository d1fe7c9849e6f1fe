//! Expression tokenizer
//!
//! Identifiers: `[A-Za-z_][A-Za-z0-9_]*`. Numbers: `digits[.digits][e[+-]digits]`
//! with an optional `_i32` / `_f32` / `_bf16` type marker. Operator
//! characters outside `+ - *` are tokenized so the parser can reject them
//! by name instead of as garbage.

use crate::error::{Error, Result};
use crate::table::Repr;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number { value: f64, repr: Option<Repr> },
    Plus,
    Minus,
    Star,
    /// Recognized operator with no kernel (`/ % & | ^`)
    Unsupported(char),
    LParen,
    RParen,
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub pos: usize,
}

pub struct Lexer<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(input: &'s str) -> Self {
        Lexer { input, pos: 0 }
    }

    /// Tokenize the whole input; the last token is always `End`
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::End;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::End,
                pos: start,
            });
        };

        let kind = match ch {
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'*' => self.single(TokenKind::Star),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'/' | b'%' | b'&' | b'|' | b'^' => self.single(TokenKind::Unsupported(ch as char)),
            c if c.is_ascii_alphabetic() || c == b'_' => TokenKind::Ident(self.ident().to_string()),
            c if c.is_ascii_digit() || c == b'.' => self.number()?,
            _ => {
                // Report the full character, not a UTF-8 fragment
                let bad = self.input[start..].chars().next().unwrap_or('?');
                return Err(Error::parse(start, format!("unexpected character {bad:?}")));
            }
        };
        Ok(Token { kind, pos: start })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn ident(&mut self) -> &'s str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        let input = self.input;
        &input[start..self.pos]
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let mut integral = true;

        let whole = self.digits();
        if self.peek() == Some(b'.') {
            integral = false;
            self.pos += 1;
            let frac = self.digits();
            if whole == 0 && frac == 0 {
                return Err(Error::parse(start, "expected digits around '.'"));
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            integral = false;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                return Err(Error::parse(self.pos, "expected exponent digits"));
            }
        }

        let input = self.input;
        let text = &input[start..self.pos];
        let value: f64 = text
            .parse()
            .map_err(|_| Error::parse(start, format!("invalid numeric literal {text:?}")))?;

        let repr = match self.peek() {
            Some(b'_') => {
                let marker_pos = self.pos + 1;
                self.pos += 1;
                let marker = self.ident();
                let repr = Repr::from_marker(marker).ok_or_else(|| {
                    Error::parse(marker_pos, format!("unknown type marker {marker:?}"))
                })?;
                if repr == Repr::Int32 && !integral {
                    return Err(Error::parse(
                        start,
                        format!("literal {text} is not an integer but is marked i32"),
                    ));
                }
                Some(repr)
            }
            Some(c) if c.is_ascii_alphabetic() => {
                return Err(Error::parse(
                    self.pos,
                    format!("invalid suffix on numeric literal {text:?}"),
                ));
            }
            _ => None,
        };

        Ok(TokenKind::Number { value, repr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("a*b + c_1"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Star,
                TokenKind::Ident("b".into()),
                TokenKind::Plus,
                TokenKind::Ident("c_1".into()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_typed_literals() {
        assert_eq!(
            kinds("2_i32 2.5_f32 4e1_bf16 .5"),
            vec![
                TokenKind::Number { value: 2.0, repr: Some(Repr::Int32) },
                TokenKind::Number { value: 2.5, repr: Some(Repr::Float32) },
                TokenKind::Number { value: 40.0, repr: Some(Repr::BFloat16) },
                TokenKind::Number { value: 0.5, repr: None },
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_unsupported_operator_tokenized() {
        assert_eq!(kinds("a / b")[1], TokenKind::Unsupported('/'));
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("  ab +  (c)").tokenize().unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.pos).collect();
        assert_eq!(positions, vec![2, 5, 8, 9, 10, 11]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("a $ b").tokenize(),
            Err(Error::Parse { position: 2, .. })
        ));
        assert!(matches!(
            Lexer::new("2_u8").tokenize(),
            Err(Error::Parse { position: 2, .. })
        ));
        assert!(matches!(Lexer::new("2.5_i32").tokenize(), Err(Error::Parse { .. })));
        assert!(matches!(Lexer::new("2abc").tokenize(), Err(Error::Parse { .. })));
        assert!(matches!(Lexer::new("1e").tokenize(), Err(Error::Parse { .. })));
        assert!(matches!(Lexer::new(".").tokenize(), Err(Error::Parse { .. })));
    }
}
