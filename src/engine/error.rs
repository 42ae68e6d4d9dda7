// SPDX-License-Identifier: MIT

//! Typed error handling for dossier-rs
//!
//! `ConditionError` covers the expression language and never escapes
//! [`crate::engine::condition::evaluate`]. `DossierError` is what the
//! platform layer, the CLI and the HTTP API see.

use thiserror::Error;

/// Top-level error type for dossier-rs
#[derive(Debug, Error)]
pub enum DossierError {
    /// Configuration errors (missing directories, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No plugin directory for the requested report
    #[error("Report '{id}' not found")]
    ReportNotFound { id: String },

    /// Plugin directory exists but its template file does not
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Form data failed validation
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Template compilation or rendering errors
    #[error("Template error: {0}")]
    Template(String),

    /// Interactive prompt failures
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Unknown form session
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    /// Session store is full of live sessions
    #[error("Too many open sessions (limit {0})")]
    TooManySessions(usize),

    /// Malformed HTTP request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Condition errors surfaced where a caller asked for them explicitly
    #[error("Condition error: {0}")]
    Condition(#[from] ConditionError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Expression language errors: lexing, parsing and evaluation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConditionError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid number '{text}' at position {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("unexpected {found} at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expression nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("expression longer than {limit} tokens")]
    TooLong { limit: usize },

    #[error("name '{0}' is not defined")]
    UnknownVariable(String),
}

impl DossierError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a report not found error
    pub fn report_not_found(id: impl Into<String>) -> Self {
        Self::ReportNotFound { id: id.into() }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<handlebars::RenderError> for DossierError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for DossierError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<dialoguer::Error> for DossierError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}
