// SPDX-License-Identifier: MIT

//! Field descriptors consumed from plugin configuration
//!
//! Keys are English; the Spanish keys used by existing report plugins
//! (`nombre`, `tipo`, `seccion`, `dependencia`, ...) are accepted as aliases.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// One input of a report form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    #[serde(alias = "nombre", default)]
    pub label: String,
    #[serde(rename = "type", alias = "tipo", alias = "tipo_control", default)]
    pub kind: FieldKind,
    #[serde(alias = "seccion", default)]
    pub section: Option<String>,
    #[serde(alias = "requerido", default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(alias = "ayuda", alias = "descripcion", default)]
    pub help: Option<String>,
    #[serde(alias = "opciones", default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Derived by the report handler (from the `general.yaml` setting with
    /// the same id); never asked
    #[serde(alias = "calculado", default)]
    pub computed: bool,
    /// Free-form visibility condition
    #[serde(alias = "condicion_padre", default)]
    pub parent_condition: Option<String>,
    /// Structured visibility rule on a single parent variable
    #[serde(alias = "dependencia", default)]
    pub dependency: Option<FieldDependency>,
}

/// Input kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    #[serde(alias = "texto")]
    Text,
    #[serde(alias = "texto_largo")]
    LongText,
    #[serde(alias = "numero")]
    Number,
    #[serde(alias = "lista")]
    List,
    #[serde(alias = "fecha")]
    Date,
    Radio,
    Select,
}

impl FieldKind {
    /// Kinds whose answer must be one of the declared options
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::List | FieldKind::Radio | FieldKind::Select)
    }
}

/// Option of a choice field: a bare value or a labelled one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    Plain(String),
    Labeled {
        #[serde(alias = "valor")]
        value: String,
        #[serde(alias = "etiqueta", default)]
        label: Option<String>,
        #[serde(alias = "es_default", default)]
        default: bool,
    },
}

impl FieldOption {
    pub fn value(&self) -> &str {
        match self {
            FieldOption::Plain(v) => v,
            FieldOption::Labeled { value, .. } => value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FieldOption::Plain(v) => v,
            FieldOption::Labeled { value, label, .. } => label.as_deref().unwrap_or(value),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, FieldOption::Labeled { default: true, .. })
    }
}

/// Visibility as a function of one other variable's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDependency {
    pub variable: String,
    #[serde(alias = "valor", default)]
    pub equals: Option<Value>,
    #[serde(alias = "valor_no", default)]
    pub not_equals: Option<Value>,
}

impl FieldDefinition {
    /// Minimal text field, mostly for tests and programmatic forms
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind,
            section: None,
            required: false,
            placeholder: None,
            help: None,
            options: Vec::new(),
            min: None,
            max: None,
            computed: false,
            parent_condition: None,
            dependency: None,
        }
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_parent_condition(mut self, condition: impl Into<String>) -> Self {
        self.parent_condition = Some(condition.into());
        self
    }

    pub fn with_dependency(mut self, dependency: FieldDependency) -> Self {
        self.dependency = Some(dependency);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|o| FieldOption::Plain(o.into()))
            .collect();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Value a choice field starts with: the option flagged as default,
    /// otherwise the first one.
    pub fn default_choice(&self) -> Option<&FieldOption> {
        if !self.kind.is_choice() {
            return None;
        }
        self.options
            .iter()
            .find(|o| o.is_default())
            .or_else(|| self.options.first())
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value() == value)
    }
}

impl FieldDependency {
    pub fn equals(variable: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            variable: variable.into(),
            equals: Some(value.into()),
            not_equals: None,
        }
    }

    pub fn not_equals(variable: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            variable: variable.into(),
            equals: None,
            not_equals: Some(value.into()),
        }
    }
}
