// SPDX-License-Identifier: MIT

//! Conditions written as YAML structures instead of expression strings

use serde::{Deserialize, Serialize};

use super::ast::{CompareOp, Expression, Literal};
use super::evaluator::{evaluate, evaluate_expression};
use crate::engine::context::Context;
use crate::engine::value::Value;

/// Structured condition from configuration
///
/// ```yaml
/// or:
///   - { field: tipo_opinion, equals: favorable }
///   - and:
///       - { campo: tipo_opinion, igual: con_salvedades }
///       - { campo: salvedad_material, no_igual: si }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionSpec {
    Equals {
        #[serde(alias = "campo")]
        field: String,
        #[serde(alias = "igual")]
        equals: Value,
    },
    NotEquals {
        #[serde(alias = "campo")]
        field: String,
        #[serde(alias = "no_igual")]
        not_equals: Value,
    },
    All {
        and: Vec<ConditionSpec>,
    },
    Any {
        or: Vec<ConditionSpec>,
    },
    /// Anything else; reads as `true` with a warning
    Unrecognized(serde_yaml::Value),
}

impl ConditionSpec {
    /// Convert to an expression tree
    pub fn to_expression(&self) -> Expression {
        match self {
            ConditionSpec::Equals { field, equals } => Expression::compare(
                Expression::variable(field.as_str()),
                CompareOp::Eq,
                Expression::Literal(value_literal(equals)),
            ),
            ConditionSpec::NotEquals { field, not_equals } => Expression::compare(
                Expression::variable(field.as_str()),
                CompareOp::NotEq,
                Expression::Literal(value_literal(not_equals)),
            ),
            ConditionSpec::All { and } => fold(and, Expression::And),
            ConditionSpec::Any { or } => fold(or, Expression::Or),
            ConditionSpec::Unrecognized(serde_yaml::Value::Bool(b)) => {
                Expression::Literal(Literal::Boolean(*b))
            }
            ConditionSpec::Unrecognized(raw) => {
                log::warn!("Could not build condition from: {:?}", raw);
                Expression::Literal(Literal::Boolean(true))
            }
        }
    }
}

/// Join parts with `and`/`or`; an empty group is always false
fn fold(
    parts: &[ConditionSpec],
    join: fn(Box<Expression>, Box<Expression>) -> Expression,
) -> Expression {
    parts
        .iter()
        .map(ConditionSpec::to_expression)
        .reduce(|acc, next| join(Box::new(acc), Box::new(next)))
        .unwrap_or(Expression::Literal(Literal::Boolean(false)))
}

/// Structured values always compare as text: `igual: 2` matches the answer `"2"`
fn value_literal(value: &Value) -> Literal {
    let text = match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    };
    Literal::String(text)
}

/// A condition as written in configuration: expression string or structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Expression(String),
    Structured(ConditionSpec),
}

impl Condition {
    /// Evaluate against a context; never fails
    pub fn evaluate(&self, context: &Context) -> bool {
        match self {
            Condition::Expression(source) => evaluate(source, context),
            Condition::Structured(spec) => evaluate_expression(&spec.to_expression(), context),
        }
    }

    /// Source text, canonicalized for structured conditions
    pub fn source(&self) -> String {
        match self {
            Condition::Expression(source) => source.clone(),
            Condition::Structured(spec) => spec.to_expression().to_string(),
        }
    }
}

impl From<&str> for Condition {
    fn from(source: &str) -> Self {
        Condition::Expression(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_to_expression() {
        let spec: ConditionSpec =
            serde_yaml::from_str("{ campo: tipo_opinion, igual: favorable }").unwrap();
        assert_eq!(spec.to_expression().to_string(), "tipo_opinion == 'favorable'");
    }

    #[test]
    fn test_not_equals_to_expression() {
        let spec: ConditionSpec =
            serde_yaml::from_str("{ field: tipo_opinion, not_equals: adversa }").unwrap();
        assert_eq!(spec.to_expression().to_string(), "tipo_opinion != 'adversa'");
    }

    #[test]
    fn test_nested_to_expression() {
        let yaml = r#"
or:
  - { field: a, equals: x }
  - and:
      - { campo: b, igual: 2 }
      - { campo: c, no_igual: z }
"#;
        let spec: ConditionSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            spec.to_expression().to_string(),
            "(a == 'x') or ((b == '2') and (c != 'z'))"
        );
    }

    #[test]
    fn test_empty_groups_are_false() {
        let ctx = Context::new();
        let all: ConditionSpec = serde_yaml::from_str("and: []").unwrap();
        let any: ConditionSpec = serde_yaml::from_str("or: []").unwrap();
        assert!(!evaluate_expression(&all.to_expression(), &ctx));
        assert!(!evaluate_expression(&any.to_expression(), &ctx));
    }

    #[test]
    fn test_numeric_value_matches_text_answer() {
        let spec: ConditionSpec = serde_yaml::from_str("{ campo: anio, igual: 2 }").unwrap();
        assert_eq!(spec.to_expression().to_string(), "anio == '2'");

        let ctx: Context = [("anio", "2")].into_iter().collect();
        assert!(evaluate_expression(&spec.to_expression(), &ctx));

        let numeric: Context = [("anio", 2)].into_iter().collect();
        assert!(!evaluate_expression(&spec.to_expression(), &numeric));
    }

    #[test]
    fn test_boolean_value_compares_as_text() {
        let spec: ConditionSpec =
            serde_yaml::from_str("{ field: auditada, not_equals: true }").unwrap();
        assert_eq!(spec.to_expression().to_string(), "auditada != 'True'");
    }

    #[test]
    fn test_unrecognized_reads_as_true() {
        let spec: ConditionSpec = serde_yaml::from_str("{ campo: a, mayor: 3 }").unwrap();
        assert!(matches!(spec, ConditionSpec::Unrecognized(_)));
        assert_eq!(spec.to_expression(), Expression::Literal(Literal::Boolean(true)));
    }

    #[test]
    fn test_boolean_condition() {
        let ctx = Context::new();
        let always: Condition = serde_yaml::from_str("true").unwrap();
        let never: Condition = serde_yaml::from_str("false").unwrap();
        assert!(always.evaluate(&ctx));
        assert!(!never.evaluate(&ctx));
    }

    #[test]
    fn test_condition_either_form() {
        let ctx: Context = [("tipo_opinion", "favorable")].into_iter().collect();

        let text: Condition = serde_yaml::from_str("\"tipo_opinion == 'favorable'\"").unwrap();
        assert!(matches!(text, Condition::Expression(_)));
        assert!(text.evaluate(&ctx));

        let structured: Condition =
            serde_yaml::from_str("{ field: tipo_opinion, equals: adversa }").unwrap();
        assert!(matches!(structured, Condition::Structured(_)));
        assert!(!structured.evaluate(&ctx));
        assert_eq!(structured.source(), "tipo_opinion == 'adversa'");
    }
}
