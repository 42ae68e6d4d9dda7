// SPDX-License-Identifier: MIT

//! Answer sources for the form pass: preset maps and terminal prompts

use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::fs;
use std::path::Path;

use crate::engine::accumulator::AnswerSource;
use crate::engine::context::Context;
use crate::engine::error::DossierError;
use crate::engine::field::{FieldDefinition, FieldKind};
use crate::engine::value::Value;

/// Answers from a fixed map.
///
/// A field without an entry keeps the value already in the context; failing
/// that, a choice field takes its default option, as an untouched radio
/// button would.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetAnswers {
    answers: Context,
}

impl PresetAnswers {
    pub fn new(answers: Context) -> Self {
        Self { answers }
    }

    /// Load answers from a YAML or JSON file holding a flat mapping
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DossierError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, DossierError> {
        let answers: Context = serde_yaml::from_str(content)?;
        Ok(Self::new(answers))
    }

    pub fn answers(&self) -> &Context {
        &self.answers
    }
}

impl AnswerSource for PresetAnswers {
    fn answer(
        &mut self,
        _section: &str,
        field: &FieldDefinition,
        current: Option<&Value>,
    ) -> Result<Option<Value>, DossierError> {
        if let Some(value) = self.answers.get(&field.id).or(current) {
            return Ok(Some(value.clone()));
        }
        Ok(field
            .default_choice()
            .map(|option| Value::from(option.value())))
    }
}

/// Interactive terminal prompts
#[derive(Default)]
pub struct PromptAnswers {
    theme: ColorfulTheme,
    current_section: Option<String>,
}

impl PromptAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    fn announce_section(&mut self, section: &str) {
        if self.current_section.as_deref() != Some(section) {
            println!("\n== {} ==", section);
            self.current_section = Some(section.to_string());
        }
    }

    fn choose(
        &self,
        field: &FieldDefinition,
        current: Option<&Value>,
    ) -> Result<Option<Value>, DossierError> {
        let labels: Vec<&str> = field.options.iter().map(|o| o.label()).collect();
        let current = current.map(Value::to_string);
        let default = field
            .options
            .iter()
            .position(|o| Some(o.value()) == current.as_deref())
            .or_else(|| field.options.iter().position(|o| o.is_default()))
            .unwrap_or(0);

        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt_text(field))
            .items(&labels)
            .default(default)
            .interact()?;

        Ok(field
            .options
            .get(index)
            .map(|option| Value::from(option.value())))
    }

    fn type_in(
        &self,
        field: &FieldDefinition,
        current: Option<&Value>,
    ) -> Result<Option<Value>, DossierError> {
        let kind = field.kind;
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt_text(field))
            .allow_empty(!field.required)
            .validate_with(move |text: &String| check_typed(kind, text));
        if let Some(value) = current.filter(|v| !v.is_null()) {
            input = input.with_initial_text(value.to_string());
        }

        let text = input.interact_text()?;
        Ok(typed_value(kind, &text))
    }
}

impl AnswerSource for PromptAnswers {
    fn answer(
        &mut self,
        section: &str,
        field: &FieldDefinition,
        current: Option<&Value>,
    ) -> Result<Option<Value>, DossierError> {
        self.announce_section(section);
        if let Some(help) = &field.help {
            println!("  {}", help);
        }

        if field.kind.is_choice() && !field.options.is_empty() {
            self.choose(field, current)
        } else {
            self.type_in(field, current)
        }
    }
}

fn prompt_text(field: &FieldDefinition) -> String {
    let label = if field.label.is_empty() {
        &field.id
    } else {
        &field.label
    };
    match (&field.placeholder, field.required) {
        (Some(hint), true) => format!("{} ({}) *", label, hint),
        (Some(hint), false) => format!("{} ({})", label, hint),
        (None, true) => format!("{} *", label),
        (None, false) => label.to_string(),
    }
}

/// Input check applied while typing; empty input is decided by `allow_empty`
fn check_typed(kind: FieldKind, text: &str) -> Result<(), String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    match (kind, Value::parse_scalar(text)) {
        (FieldKind::Number, Value::Number(_)) => Ok(()),
        (FieldKind::Number, _) => Err("enter a number".to_string()),
        (FieldKind::Date, Value::Date(_)) => Ok(()),
        (FieldKind::Date, _) => Err("enter a date as YYYY-MM-DD".to_string()),
        _ => Ok(()),
    }
}

/// Typed value for what the user entered; empty input leaves the field
/// unanswered
fn typed_value(kind: FieldKind, text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = match kind {
        FieldKind::Number | FieldKind::Date => Value::parse_scalar(trimmed),
        _ => Value::from(text),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::field::FieldOption;

    fn opinion() -> FieldDefinition {
        let mut field = FieldDefinition::new("tipo_opinion", FieldKind::Radio);
        field.options = vec![
            FieldOption::Plain("favorable".to_string()),
            FieldOption::Labeled {
                value: "con_salvedades".to_string(),
                label: None,
                default: true,
            },
        ];
        field
    }

    #[test]
    fn test_preset_returns_answer() {
        let mut source = PresetAnswers::parse("tipo_opinion: favorable\nimporte: 12").unwrap();
        let value = source.answer("S", &opinion(), None).unwrap();
        assert_eq!(value, Some(Value::from("favorable")));

        let importe = FieldDefinition::new("importe", FieldKind::Number);
        assert_eq!(
            source.answer("S", &importe, None).unwrap(),
            Some(Value::Number(12.0))
        );
    }

    #[test]
    fn test_preset_falls_back_to_default_option() {
        let mut source = PresetAnswers::default();
        assert_eq!(
            source.answer("S", &opinion(), None).unwrap(),
            Some(Value::from("con_salvedades"))
        );

        let text = FieldDefinition::new("entidad", FieldKind::Text);
        assert_eq!(source.answer("S", &text, None).unwrap(), None);
    }

    #[test]
    fn test_preset_keeps_current_value() {
        let mut source = PresetAnswers::default();
        let current = Value::from("favorable");
        assert_eq!(
            source.answer("S", &opinion(), Some(&current)).unwrap(),
            Some(current)
        );
    }

    #[test]
    fn test_preset_parses_json() {
        let source = PresetAnswers::parse(r#"{"entidad": "ACME", "fecha": "2024-03-31"}"#).unwrap();
        assert_eq!(source.answers().len(), 2);
        assert!(matches!(source.answers().get("fecha"), Some(Value::Date(_))));
    }

    #[test]
    fn test_preset_rejects_non_mapping() {
        assert!(matches!(
            PresetAnswers::parse("- a\n- b\n"),
            Err(DossierError::Yaml(_))
        ));
    }

    #[test]
    fn test_prompt_text() {
        let mut field = FieldDefinition::new("entidad", FieldKind::Text).required();
        field.label = "Entidad".to_string();
        assert_eq!(prompt_text(&field), "Entidad *");

        field.placeholder = Some("razón social".to_string());
        field.required = false;
        assert_eq!(prompt_text(&field), "Entidad (razón social)");
    }

    #[test]
    fn test_check_typed() {
        assert!(check_typed(FieldKind::Number, "12.5").is_ok());
        assert!(check_typed(FieldKind::Number, "doce").is_err());
        assert!(check_typed(FieldKind::Date, "2024-02-30").is_err());
        assert!(check_typed(FieldKind::Date, "").is_ok());
        assert!(check_typed(FieldKind::Text, "cualquier cosa").is_ok());
    }

    #[test]
    fn test_typed_value() {
        assert_eq!(typed_value(FieldKind::Text, "  "), None);
        assert_eq!(typed_value(FieldKind::Number, "7"), Some(Value::Number(7.0)));
        assert_eq!(typed_value(FieldKind::Text, "7"), Some(Value::from("7")));
    }
}
