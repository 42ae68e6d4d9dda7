// SPDX-License-Identifier: MIT

//! Sequential form pass
//!
//! Fields are visited section by section, in order. Each field's visibility
//! is decided against the context as left by every field visited before it,
//! and an answer is written into the context before the next field is
//! considered. Later fields can therefore depend on earlier answers, never
//! the other way around.

use serde::Serialize;

use super::context::Context;
use super::error::DossierError;
use super::field::FieldDefinition;
use super::value::Value;
use super::visibility::should_show;

/// Section used for fields that do not name one
pub const DEFAULT_SECTION: &str = "General";

/// Named group of fields, in definition order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

/// Ordered sections of a form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormLayout {
    sections: Vec<Section>,
}

impl FormLayout {
    /// Group fields by section.
    ///
    /// Sections named in `section_order` come first, in that order (names
    /// without fields are skipped); the remaining sections follow in the
    /// order they are first encountered.
    pub fn group<I>(fields: I, section_order: &[String]) -> Self
    where
        I: IntoIterator<Item = FieldDefinition>,
    {
        let mut encountered: Vec<Section> = Vec::new();
        for field in fields {
            let name = field
                .section
                .clone()
                .unwrap_or_else(|| DEFAULT_SECTION.to_string());
            match encountered.iter_mut().find(|s| s.name == name) {
                Some(section) => section.fields.push(field),
                None => encountered.push(Section {
                    name,
                    fields: vec![field],
                }),
            }
        }

        let mut sections = Vec::with_capacity(encountered.len());
        for name in section_order {
            if let Some(pos) = encountered.iter().position(|s| &s.name == name) {
                sections.push(encountered.remove(pos));
            }
        }
        sections.extend(encountered);

        Self { sections }
    }

    /// Append another layout's sections after this one's
    pub fn then(mut self, other: FormLayout) -> Self {
        self.sections.extend(other.sections);
        self
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Every field in visiting order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Supplies answers for visible fields (terminal prompts, request bodies)
pub trait AnswerSource {
    /// Answer for `field`; `current` is the value already in the context.
    /// `None` leaves the field unanswered.
    fn answer(
        &mut self,
        section: &str,
        field: &FieldDefinition,
        current: Option<&Value>,
    ) -> Result<Option<Value>, DossierError>;
}

/// What happened to one field during a pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldVisit {
    pub section: String,
    pub field_id: String,
    pub shown: bool,
    pub answered: bool,
}

/// Result of a form pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormOutcome {
    /// Initial context merged with every collected answer
    pub context: Context,
    /// Answers collected during this pass
    pub values: Context,
    /// Visiting order with visibility decisions
    pub visits: Vec<FieldVisit>,
}

impl FormOutcome {
    /// Ids of the fields that were shown
    pub fn shown_fields(&self) -> Vec<&str> {
        self.visits
            .iter()
            .filter(|v| v.shown)
            .map(|v| v.field_id.as_str())
            .collect()
    }
}

/// Run one sequential pass over `layout`
pub fn accumulate<S>(
    layout: &FormLayout,
    initial: Context,
    source: &mut S,
) -> Result<FormOutcome, DossierError>
where
    S: AnswerSource + ?Sized,
{
    let mut context = initial;
    let mut values = Context::new();
    let mut visits = Vec::new();

    for section in layout.sections() {
        for field in &section.fields {
            let shown = should_show(field, &context);
            let mut answered = false;

            if shown {
                if let Some(value) = source.answer(&section.name, field, context.get(&field.id))? {
                    context.insert(field.id.clone(), value.clone());
                    values.insert(field.id.clone(), value);
                    answered = true;
                }
            } else {
                log::debug!("Field '{}' hidden", field.id);
            }

            visits.push(FieldVisit {
                section: section.name.clone(),
                field_id: field.id.clone(),
                shown,
                answered,
            });
        }
    }

    Ok(FormOutcome {
        context,
        values,
        visits,
    })
}
