// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for condition expressions

use std::fmt;

/// A condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Context variable
    Variable(String),
    /// Comparison expression: left op right
    Compare {
        left: Box<Expression>,
        op: CompareOp,
        right: Box<Expression>,
    },
    /// Logical AND
    And(Box<Expression>, Box<Expression>),
    /// Logical OR
    Or(Box<Expression>, Box<Expression>),
    /// Logical NOT
    Not(Box<Expression>),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
}

/// Literal values in expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl Expression {
    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn compare(left: Expression, op: CompareOp, right: Expression) -> Self {
        Expression::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Names of the context variables this expression reads, in order of
    /// first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Variable(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Expression::Compare { left, right, .. }
            | Expression::And(left, right)
            | Expression::Or(left, right) => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expression::Not(inner) => inner.collect_variables(names),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => {
                write!(f, "'")?;
                for c in s.chars() {
                    match c {
                        '\'' => write!(f, "\\'")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "'")
            }
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// Canonical form: compound operands are parenthesized, so the output
/// parses back to the same tree.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(lit) => write!(f, "{}", lit),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Compare { left, op, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op)?;
                write_operand(f, right)
            }
            Expression::And(left, right) => {
                write_operand(f, left)?;
                write!(f, " and ")?;
                write_operand(f, right)
            }
            Expression::Or(left, right) => {
                write_operand(f, left)?;
                write!(f, " or ")?;
                write_operand(f, right)
            }
            Expression::Not(inner) => {
                write!(f, "not ")?;
                write_operand(f, inner)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expression) -> fmt::Result {
    match expr {
        Expression::Literal(_) | Expression::Variable(_) => write!(f, "{}", expr),
        _ => write!(f, "({})", expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_display() {
        assert_eq!(format!("{}", CompareOp::Eq), "==");
        assert_eq!(format!("{}", CompareOp::NotEq), "!=");
    }

    #[test]
    fn test_expression_display() {
        let expr = Expression::And(
            Box::new(Expression::compare(
                Expression::variable("tipo_opinion"),
                CompareOp::Eq,
                Expression::Literal(Literal::String("favorable".to_string())),
            )),
            Box::new(Expression::Not(Box::new(Expression::variable(
                "tiene_salvedades",
            )))),
        );
        assert_eq!(
            expr.to_string(),
            "(tipo_opinion == 'favorable') and (not tiene_salvedades)"
        );
    }

    #[test]
    fn test_string_literal_escapes() {
        let lit = Literal::String("it's".to_string());
        assert_eq!(lit.to_string(), r"'it\'s'");
    }

    #[test]
    fn test_variables_deduplicated_in_order() {
        let expr = Expression::Or(
            Box::new(Expression::compare(
                Expression::variable("b"),
                CompareOp::Eq,
                Expression::variable("a"),
            )),
            Box::new(Expression::variable("b")),
        );
        assert_eq!(expr.variables(), vec!["b".to_string(), "a".to_string()]);
    }
}
