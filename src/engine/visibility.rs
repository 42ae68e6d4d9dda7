// SPDX-License-Identifier: MIT

//! Field visibility resolution

use super::condition;
use super::context::Context;
use super::field::{FieldDefinition, FieldDependency};

/// Decide whether a field is shown for the given context snapshot.
///
/// Order of precedence: `computed` hides, then `parent_condition`, then the
/// structured `dependency`; a field with none of them is shown.
pub fn should_show(field: &FieldDefinition, context: &Context) -> bool {
    if field.computed {
        return false;
    }

    if let Some(condition) = field
        .parent_condition
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    {
        return condition::evaluate(condition, context);
    }

    if let Some(dependency) = &field.dependency {
        return dependency_satisfied(dependency, context);
    }

    true
}

/// Compare the parent variable (absent reads as null) against the literal
fn dependency_satisfied(dependency: &FieldDependency, context: &Context) -> bool {
    let current = context.get_or_null(&dependency.variable);

    if let Some(expected) = &dependency.equals {
        return current.loose_eq(expected);
    }
    if let Some(excluded) = &dependency.not_equals {
        return !current.loose_eq(excluded);
    }
    true
}
