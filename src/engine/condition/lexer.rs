//! Tokenizer for the condition language

use crate::engine::error::ConditionError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    Number(f64),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    EqEq,
    NotEq,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Str(s) => write!(f, "string '{}'", s),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::And => write!(f, "'and'"),
            TokenKind::Or => write!(f, "'or'"),
            TokenKind::Not => write!(f, "'not'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
        }
    }
}

/// Split an expression into tokens. Positions are character offsets.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let kind = match c {
            '(' => {
                i += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                TokenKind::RParen
            }
            '=' | '!' => {
                if chars.get(i + 1) != Some(&'=') {
                    return Err(ConditionError::UnexpectedChar { ch: c, pos: i });
                }
                i += 2;
                if c == '=' {
                    TokenKind::EqEq
                } else {
                    TokenKind::NotEq
                }
            }
            '\'' | '"' => {
                let (s, next) = read_string(&chars, i)?;
                i = next;
                TokenKind::Str(s)
            }
            '-' | '0'..='9' => {
                let (n, next) = read_number(&chars, i)?;
                i = next;
                TokenKind::Number(n)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                keyword(&word).unwrap_or(TokenKind::Ident(word))
            }
            other => return Err(ConditionError::UnexpectedChar { ch: other, pos: i }),
        };

        tokens.push(Token { kind, pos: start });
    }

    Ok(tokens)
}

fn keyword(word: &str) -> Option<TokenKind> {
    match word {
        "and" => Some(TokenKind::And),
        "or" => Some(TokenKind::Or),
        "not" => Some(TokenKind::Not),
        "true" | "True" => Some(TokenKind::True),
        "false" | "False" => Some(TokenKind::False),
        "null" | "None" => Some(TokenKind::Null),
        _ => None,
    }
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize), ConditionError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((out, i + 1)),
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or(ConditionError::UnterminatedString { pos: start })?;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    '\\' | '\'' | '"' => out.push(*escaped),
                    other => {
                        out.push('\\');
                        out.push(*other);
                    }
                }
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Err(ConditionError::UnterminatedString { pos: start })
}

fn read_number(chars: &[char], start: usize) -> Result<(f64, usize), ConditionError> {
    let mut i = start;
    if chars[i] == '-' {
        i += 1;
    }
    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        i += 1;
    }
    // `12abc` is one malformed token, not a number followed by a name
    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
        i += 1;
    }

    let text: String = chars[start..i].iter().collect();
    let valid = text
        .trim_start_matches('-')
        .split('.')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        && text.matches('.').count() <= 1;

    match text.parse::<f64>() {
        Ok(n) if valid => Ok((n, i)),
        _ => Err(ConditionError::InvalidNumber { text, pos: start }),
    }
}
