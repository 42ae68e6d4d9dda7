//! Condition expression evaluator

use super::ast::{CompareOp, Expression, Literal};
use super::parser::parse;
use crate::engine::context::Context;
use crate::engine::error::ConditionError;
use crate::engine::value::Value;
use serde::Serialize;

/// Evaluate a condition string against a context.
///
/// Never fails: parse and evaluation errors are logged as warnings and read
/// as `false`.
pub fn evaluate(condition: &str, context: &Context) -> bool {
    match try_evaluate(condition, context) {
        Ok(result) => result,
        Err(e) => {
            log::warn!("Error evaluating condition '{}': {}", condition, e);
            false
        }
    }
}

/// Evaluate a condition string, reporting why it could not be evaluated
pub fn try_evaluate(condition: &str, context: &Context) -> Result<bool, ConditionError> {
    let expr = parse(condition)?;
    eval_expression(&expr, context).map(|v| v.is_truthy())
}

/// Evaluate an already parsed expression, logging failures like [`evaluate`]
pub fn evaluate_expression(expr: &Expression, context: &Context) -> bool {
    match eval_expression(expr, context) {
        Ok(value) => value.is_truthy(),
        Err(e) => {
            log::warn!("Error evaluating condition '{}': {}", expr, e);
            false
        }
    }
}

/// True if at least one condition holds; false for an empty set
pub fn evaluate_any<S: AsRef<str>>(conditions: &[S], context: &Context) -> bool {
    conditions.iter().any(|c| evaluate(c.as_ref(), context))
}

/// True if every condition holds; true for an empty set
pub fn evaluate_all<S: AsRef<str>>(conditions: &[S], context: &Context) -> bool {
    conditions.iter().all(|c| evaluate(c.as_ref(), context))
}

/// Reduce an expression to a value.
///
/// `and` / `or` short-circuit and yield one of their operands, so a
/// variable that is never reached cannot fail the evaluation.
pub fn eval_expression(expr: &Expression, context: &Context) -> Result<Value, ConditionError> {
    match expr {
        Expression::Literal(lit) => Ok(literal_value(lit)),
        Expression::Variable(name) => context
            .get(name)
            .cloned()
            .ok_or_else(|| ConditionError::UnknownVariable(name.clone())),
        Expression::Compare { left, op, right } => {
            let l = eval_expression(left, context)?;
            let r = eval_expression(right, context)?;
            let equal = l.loose_eq(&r);
            Ok(Value::Bool(match op {
                CompareOp::Eq => equal,
                CompareOp::NotEq => !equal,
            }))
        }
        Expression::And(left, right) => {
            let l = eval_expression(left, context)?;
            if !l.is_truthy() {
                return Ok(l);
            }
            eval_expression(right, context)
        }
        Expression::Or(left, right) => {
            let l = eval_expression(left, context)?;
            if l.is_truthy() {
                return Ok(l);
            }
            eval_expression(right, context)
        }
        Expression::Not(inner) => {
            let v = eval_expression(inner, context)?;
            Ok(Value::Bool(!v.is_truthy()))
        }
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::String(s) => Value::Text(s.clone()),
        Literal::Number(n) => Value::Number(*n),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

/// Debug view of one condition evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionReport {
    pub condition: String,
    pub is_valid: bool,
    pub variables_used: Vec<String>,
    pub result: Option<bool>,
    pub error: Option<String>,
}

/// Parse and evaluate a condition, keeping every intermediate detail
pub fn explain(condition: &str, context: &Context) -> ConditionReport {
    match parse(condition) {
        Ok(expr) => {
            let (result, error) = match eval_expression(&expr, context) {
                Ok(v) => (Some(v.is_truthy()), None),
                Err(e) => (Some(false), Some(e.to_string())),
            };
            ConditionReport {
                condition: condition.to_string(),
                is_valid: true,
                variables_used: expr.variables(),
                result,
                error,
            }
        }
        Err(e) => ConditionReport {
            condition: condition.to_string(),
            is_valid: false,
            variables_used: Vec::new(),
            result: Some(false),
            error: Some(e.to_string()),
        },
    }
}
