// SPDX-License-Identifier: MIT

//! Form data validation against field definitions

use crate::engine::context::Context;
use crate::engine::error::DossierError;
use crate::engine::field::{FieldDefinition, FieldKind};
use crate::engine::value::Value;
use crate::engine::visibility::should_show;

/// Check collected form data; returns one message per problem.
///
/// Hidden fields are skipped entirely, so a required field only has to be
/// answered when its conditions make it visible.
pub fn validate_form_data<'a, I>(fields: I, data: &Context) -> Vec<String>
where
    I: IntoIterator<Item = &'a FieldDefinition>,
{
    let mut errors = Vec::new();

    for field in fields {
        if !should_show(field, data) {
            continue;
        }
        let label = display_name(field);

        let value = match data.get(&field.id) {
            Some(value) if !is_blank(value) => value,
            _ => {
                if field.required {
                    errors.push(format!("'{}' is required", label));
                }
                continue;
            }
        };

        match field.kind {
            FieldKind::Number => check_number(field, label, value, &mut errors),
            FieldKind::Date => {
                if !is_date(value) {
                    errors.push(format!("'{}' must be a date (YYYY-MM-DD)", label));
                }
            }
            kind if kind.is_choice() && !field.options.is_empty() => {
                let raw = value.to_string();
                if !field.has_option(&raw) {
                    errors.push(format!("'{}' has an invalid option '{}'", label, raw));
                }
            }
            _ => {}
        }
    }

    errors
}

/// [`validate_form_data`] as a `Result`
pub fn ensure_valid<'a, I>(fields: I, data: &Context) -> Result<(), DossierError>
where
    I: IntoIterator<Item = &'a FieldDefinition>,
{
    let errors = validate_form_data(fields, data);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DossierError::Validation(errors))
    }
}

fn check_number(field: &FieldDefinition, label: &str, value: &Value, errors: &mut Vec<String>) {
    let Some(n) = value.as_f64() else {
        errors.push(format!("'{}' must be a number", label));
        return;
    };
    if let Some(min) = field.min {
        if n < min {
            errors.push(format!("'{}' must be at least {}", label, Value::from(min)));
        }
    }
    if let Some(max) = field.max {
        if n > max {
            errors.push(format!("'{}' must be at most {}", label, Value::from(max)));
        }
    }
}

fn display_name(field: &FieldDefinition) -> &str {
    if field.label.is_empty() {
        &field.id
    } else {
        &field.label
    }
}

fn is_date(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Text(s) => matches!(Value::parse_scalar(s), Value::Date(_)),
        _ => false,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}
