// SPDX-License-Identifier: MIT

//! Statically linked report handlers, looked up by report id

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::handlers::{AuditOpinionHandler, StandardHandler, AUDIT_REPORT_ID};
use super::types::PluginConfig;
use crate::engine::context::Context;
use crate::engine::error::DossierError;

/// Turns collected form data into the context a template is rendered with
pub trait ReportHandler: Send + Sync {
    fn name(&self) -> &str;

    fn build_context(
        &self,
        form_data: &Context,
        plugin: &PluginConfig,
    ) -> Result<Context, DossierError>;
}

/// Report id to handler map with a standard fallback
#[derive(Clone)]
pub struct ReportRegistry {
    handlers: HashMap<String, Arc<dyn ReportHandler>>,
    fallback: Arc<dyn ReportHandler>,
}

impl ReportRegistry {
    /// Empty registry; every report resolves to [`StandardHandler`]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(StandardHandler::new()),
        }
    }

    /// Registry with every handler shipped in this crate
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(AUDIT_REPORT_ID, Arc::new(AuditOpinionHandler::new()));
        registry
    }

    pub fn register(&mut self, report_id: impl Into<String>, handler: Arc<dyn ReportHandler>) {
        let report_id = report_id.into();
        log::debug!("Registered handler '{}' for {}", handler.name(), report_id);
        self.handlers.insert(report_id, handler);
    }

    /// Handler registered for exactly this id
    pub fn get(&self, report_id: &str) -> Option<Arc<dyn ReportHandler>> {
        self.handlers.get(report_id).cloned()
    }

    /// Registered handler, or the standard one
    pub fn resolve(&self, report_id: &str) -> Arc<dyn ReportHandler> {
        self.get(report_id).unwrap_or_else(|| {
            log::debug!("No specific handler for {}, using standard", report_id);
            Arc::clone(&self.fallback)
        })
    }

    pub fn report_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ReportRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ReportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportRegistry")
            .field("handlers", &self.report_ids())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
