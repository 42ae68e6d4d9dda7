// SPDX-License-Identifier: MIT

//! Condition evaluation for form fields and text blocks
//!
//! Conditions are small boolean expressions over the answer context:
//! - `tipo_opinion == 'favorable'`
//! - `tiene_salvedades and tipo_opinion != 'adversa'`
//! - `not (ejercicio == 2024 or es_consolidado)`
//!
//! Identifiers resolve only against the supplied [`Context`]; there are no
//! calls, attributes or other operators.
//!
//! [`Context`]: crate::engine::Context

mod ast;
mod evaluator;
mod lexer;
mod parser;
mod structured;

pub use ast::{CompareOp, Expression, Literal};
pub use evaluator::{
    eval_expression, evaluate, evaluate_all, evaluate_any, evaluate_expression, explain,
    try_evaluate, ConditionReport,
};
pub use parser::{is_valid_expression, parse, MAX_DEPTH, MAX_TOKENS};
pub use structured::{Condition, ConditionSpec};
