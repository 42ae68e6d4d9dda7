//! Recursive-descent parser for condition expressions
//!
//! Parses expressions like:
//! - `tipo_opinion == 'favorable'`
//! - `not tiene_salvedades`
//! - `(a == 'x' or b != 5) and c`

use super::ast::{CompareOp, Expression, Literal};
use super::lexer::{tokenize, Token, TokenKind};
use crate::engine::error::ConditionError;

/// Maximum nesting of parentheses and `not`
pub const MAX_DEPTH: usize = 64;

/// Maximum number of tokens in one expression
pub const MAX_TOKENS: usize = 1024;

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Expression, ConditionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ConditionError::Empty);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ConditionError::TooLong { limit: MAX_TOKENS });
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;

    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(unexpected(token)),
    }
}

/// Check syntax only
pub fn is_valid_expression(input: &str) -> bool {
    parse(input).is_ok()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, ConditionError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ConditionError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> Result<(), ConditionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ConditionError::NestingTooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression, ConditionError> {
        if self.eat(&TokenKind::Not) {
            self.enter()?;
            let inner = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expression::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, ConditionError> {
        let left = self.parse_operand()?;

        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::EqEq) => CompareOp::Eq,
            Some(TokenKind::NotEq) => CompareOp::NotEq,
            _ => return Ok(left),
        };
        self.pos += 1;

        let right = self.parse_operand()?;

        // Chained comparisons are not part of the language
        if let Some(token) = self.peek() {
            if matches!(token.kind, TokenKind::EqEq | TokenKind::NotEq) {
                return Err(unexpected(token));
            }
        }

        Ok(Expression::compare(left, op, right))
    }

    fn parse_operand(&mut self) -> Result<Expression, ConditionError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Ident(name) => Ok(Expression::Variable(name)),
            TokenKind::Str(s) => Ok(Expression::Literal(Literal::String(s))),
            TokenKind::Number(n) => Ok(Expression::Literal(Literal::Number(n))),
            TokenKind::True => Ok(Expression::Literal(Literal::Boolean(true))),
            TokenKind::False => Ok(Expression::Literal(Literal::Boolean(false))),
            TokenKind::Null => Ok(Expression::Literal(Literal::Null)),
            TokenKind::LParen => {
                self.enter()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.next() {
                    Ok(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Ok(other) => Err(unexpected(&other)),
                    Err(e) => Err(e),
                }
            }
            _ => Err(unexpected(&token)),
        }
    }
}

fn unexpected(token: &Token) -> ConditionError {
    ConditionError::UnexpectedToken {
        found: token.kind.to_string(),
        pos: token.pos,
    }
}
