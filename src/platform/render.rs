// SPDX-License-Identifier: MIT

//! Document rendering and output files
//!
//! Templates are Handlebars text. HTML escaping is off and missing
//! variables render as empty strings.

use chrono::{DateTime, Local};
use handlebars::Handlebars;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::config::ensure_directory;
use crate::engine::context::Context;
use crate::engine::error::DossierError;

/// Longest file stem produced by [`safe_filename`]
pub const MAX_FILENAME_LEN: usize = 200;

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").expect("variable pattern is valid")
});

/// Handlebars wrapper configured for plain-text documents
#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    registry: Handlebars<'static>,
}

impl DocumentRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(false);
        Self { registry }
    }

    pub fn render_str(&self, template: &str, context: &Context) -> Result<String, DossierError> {
        Ok(self.registry.render_template(template, context)?)
    }

    /// Like [`render_str`](Self::render_str) but logs failures and yields
    /// an empty string
    pub fn render_lenient(&self, template: &str, context: &Context) -> String {
        match self.render_str(template, context) {
            Ok(text) => text,
            Err(e) => {
                log::error!("Error rendering template: {}", e);
                String::new()
            }
        }
    }

    pub fn render_file<P: AsRef<Path>>(
        &self,
        path: P,
        context: &Context,
    ) -> Result<String, DossierError> {
        let path = path.as_ref();
        let template = fs::read_to_string(path).map_err(|e| {
            DossierError::TemplateNotFound(format!("{}: {}", path.display(), e))
        })?;
        self.render_str(&template, context)
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Names used as `{{ name }}` in a template, sorted and deduplicated
pub fn template_variables(template: &str) -> Vec<String> {
    VARIABLE_PATTERN
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Starter template listing the given variables
pub fn sample_template<S: AsRef<str>>(variables: &[S]) -> String {
    let mut content = String::from("# Sample template\n\n");
    for var in variables {
        content.push_str(&format!("{{{{ {} }}}}\n\n", var.as_ref()));
    }
    content
}

/// Replace characters that are invalid in file names, cap the length and
/// trim surrounding whitespace
pub fn safe_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .take(MAX_FILENAME_LEN)
        .collect();
    replaced.trim().to_string()
}

/// Metadata written next to every generated document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub report_id: String,
    pub report_name: String,
    pub version: String,
    pub generated_at: DateTime<Local>,
    pub document: String,
    pub form_data: Context,
    pub blocks: BTreeMap<String, String>,
}

/// Files written for one generated report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReport {
    pub document_path: PathBuf,
    pub metadata_path: PathBuf,
    pub metadata: ReportMetadata,
}

/// Write `<id>_<timestamp>.txt` and the matching `.json` metadata
pub fn write_report(
    output_dir: &Path,
    metadata: ReportMetadata,
) -> Result<GeneratedReport, DossierError> {
    ensure_directory(output_dir)?;

    let stem = format!(
        "{}_{}",
        safe_filename(&metadata.report_id),
        metadata.generated_at.format("%Y%m%d_%H%M%S")
    );
    let document_path = output_dir.join(format!("{}.txt", stem));
    let metadata_path = output_dir.join(format!("{}.json", stem));

    fs::write(&document_path, &metadata.document)?;
    fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;

    log::info!("Report written to {}", document_path.display());

    Ok(GeneratedReport {
        document_path,
        metadata_path,
        metadata,
    })
}
