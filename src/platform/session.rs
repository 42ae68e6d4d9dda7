// SPDX-License-Identifier: MIT

//! Report sessions: one plugin, one handler and the answers collected so far

use chrono::{DateTime, Duration, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::loader::PluginLoader;
use super::registry::ReportHandler;
use super::render::{write_report, DocumentRenderer, GeneratedReport, ReportMetadata};
use super::types::PluginConfig;
use super::validation::{ensure_valid, validate_form_data};
use crate::engine::accumulator::{accumulate, AnswerSource, FormOutcome};
use crate::engine::context::Context;
use crate::engine::error::DossierError;

/// State of one report being filled in
#[derive(Clone)]
pub struct ReportSession {
    id: Uuid,
    plugin: Arc<PluginConfig>,
    handler: Arc<dyn ReportHandler>,
    form_data: Context,
    created_at: DateTime<Local>,
}

impl ReportSession {
    /// New session with empty form data
    pub fn new(plugin: Arc<PluginConfig>, handler: Arc<dyn ReportHandler>) -> Self {
        let id = Uuid::new_v4();
        log::debug!(
            "Session {} started for {} (handler: {})",
            id,
            plugin.id(),
            handler.name()
        );
        Self {
            id,
            plugin,
            handler,
            form_data: Context::new(),
            created_at: Local::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn plugin(&self) -> &PluginConfig {
        &self.plugin
    }

    pub fn form_data(&self) -> &Context {
        &self.form_data
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Whether the session is at least `ttl` old
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Local::now() - self.created_at >= ttl
    }

    /// Run a form pass over the plugin layout, starting from the answers
    /// already collected
    pub fn fill<S>(&mut self, source: &mut S) -> Result<FormOutcome, DossierError>
    where
        S: AnswerSource + ?Sized,
    {
        let outcome = accumulate(&self.plugin.layout(), self.form_data.clone(), source)?;
        self.form_data = outcome.context.clone();
        Ok(outcome)
    }

    /// Validation messages for the current answers
    pub fn validate(&self) -> Vec<String> {
        validate_form_data(self.plugin.all_fields(), &self.form_data)
    }

    /// Context the template will see
    pub fn build_context(&self) -> Result<Context, DossierError> {
        self.handler.build_context(&self.form_data, &self.plugin)
    }

    /// Validate, render the plugin template and write the document with its
    /// metadata to `output_dir`
    pub fn generate(
        &self,
        renderer: &DocumentRenderer,
        output_dir: &Path,
    ) -> Result<GeneratedReport, DossierError> {
        ensure_valid(self.plugin.all_fields(), &self.form_data)?;

        log::info!("Building context for {}", self.plugin.id());
        let context = self.build_context()?;
        let template_path = PluginLoader::template_path(&self.plugin)?;

        log::info!("Rendering {}", template_path.display());
        let document = renderer.render_file(&template_path, &context)?;

        let manifest = &self.plugin.manifest;
        let metadata = ReportMetadata {
            report_id: manifest.id.clone(),
            report_name: manifest.name.clone(),
            version: manifest.version.clone(),
            generated_at: Local::now(),
            document,
            form_data: self.form_data.clone(),
            blocks: block_texts(&self.plugin, &context),
        };

        write_report(output_dir, metadata)
    }
}

impl std::fmt::Debug for ReportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSession")
            .field("id", &self.id)
            .field("report", &self.plugin.id())
            .field("handler", &self.handler.name())
            .field("form_data", &self.form_data)
            .finish()
    }
}

/// Form pass and block texts for a set of answers, without a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub outcome: FormOutcome,
    pub blocks: BTreeMap<String, String>,
    pub errors: Vec<String>,
}

/// Run a pass with `source` over a fresh context and render the blocks
pub fn preview<S>(
    plugin: &PluginConfig,
    handler: &dyn ReportHandler,
    source: &mut S,
) -> Result<Preview, DossierError>
where
    S: AnswerSource + ?Sized,
{
    let outcome = accumulate(&plugin.layout(), Context::new(), source)?;
    let context = handler.build_context(&outcome.context, plugin)?;
    let errors = validate_form_data(plugin.all_fields(), &outcome.context);

    Ok(Preview {
        blocks: block_texts(plugin, &context),
        errors,
        outcome,
    })
}

fn block_texts(plugin: &PluginConfig, context: &Context) -> BTreeMap<String, String> {
    plugin
        .blocks
        .iter()
        .map(|block| {
            let text = context
                .get(&block.id)
                .map(|v| v.to_string())
                .unwrap_or_default();
            (block.id.clone(), text)
        })
        .collect()
}
