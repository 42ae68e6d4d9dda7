// SPDX-License-Identifier: MIT

//! YAML schema types for report plugins
//!
//! A plugin is a directory holding `manifest.yaml`, a template and an
//! optional `config/` directory with the form and block definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::engine::accumulator::FormLayout;
use crate::engine::blocks::BlockDefinition;
use crate::engine::field::FieldDefinition;

/// Static descriptor of a report plugin (`manifest.yaml`)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Manifest {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(alias = "descripcion", default)]
    pub description: Option<String>,
    #[serde(alias = "autor", default)]
    pub author: Option<String>,
    pub paths: ManifestPaths,
}

/// Paths relative to the plugin directory
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ManifestPaths {
    #[serde(alias = "plantilla")]
    pub template: String,
    /// Config directory, `config` when absent
    #[serde(default)]
    pub config: Option<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// `config/general.yaml`
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct GeneralConfig {
    #[serde(alias = "secciones_orden", default)]
    pub section_order: Vec<String>,
    /// Any other key, available to report handlers
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl GeneralConfig {
    /// String setting from the extra keys
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// Fully loaded plugin
#[derive(Debug, Clone, PartialEq)]
pub struct PluginConfig {
    pub manifest: Manifest,
    pub dir: PathBuf,
    /// Plain form fields (`fields.yaml`)
    pub fields: Vec<FieldDefinition>,
    /// Choice variables that drive conditions (`variables.yaml`)
    pub variables: Vec<FieldDefinition>,
    pub blocks: Vec<BlockDefinition>,
    pub general: GeneralConfig,
}

impl PluginConfig {
    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    /// Variables first, then fields, both grouped by the declared section order
    pub fn layout(&self) -> FormLayout {
        let order = &self.general.section_order;
        FormLayout::group(self.variables.iter().cloned(), order)
            .then(FormLayout::group(self.fields.iter().cloned(), order))
    }

    /// Variables then fields, in definition order
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.variables.iter().chain(self.fields.iter())
    }

    pub fn template_path(&self) -> PathBuf {
        self.dir.join(&self.manifest.paths.template)
    }

    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            id: self.manifest.id.clone(),
            name: self.manifest.name.clone(),
            version: self.manifest.version.clone(),
            description: self.manifest.description.clone(),
            author: self.manifest.author.clone(),
            field_count: self.fields.len(),
            variable_count: self.variables.len(),
            block_count: self.blocks.len(),
        }
    }
}

/// Summary shown by `list`/`show` and the HTTP API
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub field_count: usize,
    pub variable_count: usize,
    pub block_count: usize,
}

impl From<&Manifest> for PluginInfo {
    fn from(manifest: &Manifest) -> Self {
        Self {
            id: manifest.id.clone(),
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            description: manifest.description.clone(),
            author: manifest.author.clone(),
            field_count: 0,
            variable_count: 0,
            block_count: 0,
        }
    }
}
