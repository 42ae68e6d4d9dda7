// SPDX-License-Identifier: MIT

//! Plugin loader - discovery and YAML parsing of report plugins
//!
//! Every subdirectory of the reports directory holding a readable
//! `manifest.yaml` is a plugin. Names starting with `_` or `.` are skipped.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{GeneralConfig, Manifest, PluginConfig};
use crate::engine::blocks::BlockDefinition;
use crate::engine::error::DossierError;
use crate::engine::field::FieldDefinition;

pub const MANIFEST_FILE: &str = "manifest.yaml";
pub const FIELDS_FILE: &str = "fields.yaml";
pub const VARIABLES_FILE: &str = "variables.yaml";
pub const BLOCKS_FILE: &str = "blocks.yaml";
pub const GENERAL_FILE: &str = "general.yaml";

/// Loads report plugins from a reports directory
#[derive(Debug, Clone)]
pub struct PluginLoader {
    reports_dir: PathBuf,
}

impl PluginLoader {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Manifests of every loadable plugin, sorted by id
    pub fn list_available(&self) -> Vec<Manifest> {
        let entries = match fs::read_dir(&self.reports_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::error!(
                    "Reports directory {} not readable: {}",
                    self.reports_dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut manifests = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('_') || name.starts_with('.') {
                continue;
            }

            match self.load_manifest(&path) {
                Ok(manifest) => {
                    log::info!("Found report: {} (id: {})", manifest.name, manifest.id);
                    manifests.push(manifest);
                }
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        manifests.sort_by(|a, b| a.id.cmp(&b.id));
        log::info!("{} report(s) available", manifests.len());
        manifests
    }

    /// Load `manifest.yaml` from a plugin directory
    pub fn load_manifest<P: AsRef<Path>>(&self, dir: P) -> Result<Manifest, DossierError> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|e| DossierError::config(format!("{}: {}", path.display(), e)))?;
        Self::parse_manifest(&content)
    }

    /// Load a plugin with all of its configuration files
    pub fn load_plugin(&self, report_id: &str) -> Result<PluginConfig, DossierError> {
        let dir = self.plugin_dir(report_id)?;
        let manifest = self.load_manifest(&dir)?;

        let config_dir = dir.join(manifest.paths.config.as_deref().unwrap_or("config"));
        let fields: Vec<FieldDefinition> = load_optional(&config_dir.join(FIELDS_FILE))?;
        let variables: Vec<FieldDefinition> = load_optional(&config_dir.join(VARIABLES_FILE))?;
        let blocks: Vec<BlockDefinition> = load_optional(&config_dir.join(BLOCKS_FILE))?;
        let general: GeneralConfig = load_optional(&config_dir.join(GENERAL_FILE))?;

        log::debug!(
            "Loaded report '{}': {} fields, {} variables, {} blocks",
            manifest.id,
            fields.len(),
            variables.len(),
            blocks.len()
        );

        Ok(PluginConfig {
            manifest,
            dir,
            fields,
            variables,
            blocks,
            general,
        })
    }

    /// Template file of a loaded plugin; fails if it does not exist
    pub fn template_path(plugin: &PluginConfig) -> Result<PathBuf, DossierError> {
        let path = plugin.template_path();
        if !path.is_file() {
            return Err(DossierError::TemplateNotFound(path.display().to_string()));
        }
        Ok(path)
    }

    /// Structural problems of a plugin directory; empty when valid
    pub fn validate_structure<P: AsRef<Path>>(dir: P) -> Vec<String> {
        let dir = dir.as_ref();
        let mut errors = Vec::new();

        if !dir.join(MANIFEST_FILE).is_file() {
            errors.push(format!("missing {}", MANIFEST_FILE));
        }
        if !dir.join("templates").is_dir() {
            errors.push("missing templates/ directory".to_string());
        }
        if !dir.join("config").is_dir() {
            errors.push("missing config/ directory".to_string());
        }

        errors
    }

    pub fn parse_manifest(content: &str) -> Result<Manifest, DossierError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn parse_fields(content: &str) -> Result<Vec<FieldDefinition>, DossierError> {
        parse_optional(content)
    }

    pub fn parse_blocks(content: &str) -> Result<Vec<BlockDefinition>, DossierError> {
        parse_optional(content)
    }

    pub fn parse_general(content: &str) -> Result<GeneralConfig, DossierError> {
        parse_optional(content)
    }

    fn plugin_dir(&self, report_id: &str) -> Result<PathBuf, DossierError> {
        let plausible = !report_id.is_empty()
            && !report_id.starts_with('.')
            && !report_id.starts_with('_')
            && !report_id.contains(['/', '\\']);
        let dir = self.reports_dir.join(report_id);
        if !plausible || !dir.is_dir() {
            log::error!("Report not found: {}", report_id);
            return Err(DossierError::report_not_found(report_id));
        }
        Ok(dir)
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new(super::config::DEFAULT_REPORTS_DIR)
    }
}

/// Parse YAML; an empty or comment-only document, or an explicit null,
/// yields the default value
fn parse_optional<T: DeserializeOwned + Default>(content: &str) -> Result<T, DossierError> {
    let blank = content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(T::default());
    }
    let value: Option<T> = serde_yaml::from_str(content)?;
    Ok(value.unwrap_or_default())
}

fn load_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T, DossierError> {
    if !path.is_file() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    parse_optional(&content)
        .map_err(|e| DossierError::config(format!("{}: {}", path.display(), e)))
}
