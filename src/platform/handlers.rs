// SPDX-License-Identifier: MIT

//! Built-in report handlers

use chrono::{Datelike, Local, NaiveDate};

use super::registry::ReportHandler;
use super::render::DocumentRenderer;
use super::types::PluginConfig;
use crate::engine::blocks::select_block;
use crate::engine::context::Context;
use crate::engine::error::DossierError;
use crate::engine::value::Value;

/// Report id served by [`AuditOpinionHandler`]
pub const AUDIT_REPORT_ID: &str = "informe_auditoria";

/// Form data, report identity, today's date and every text block rendered
/// against that context.
///
/// Keys added: `report_id`, `report_name`, `today`, each computed field
/// whose id names a `general.yaml` setting, plus one key per block id.
/// Answers already present under those keys are left alone.
#[derive(Debug, Clone, Default)]
pub struct StandardHandler {
    renderer: DocumentRenderer,
}

impl StandardHandler {
    pub const NAME: &'static str = "standard";

    pub fn new() -> Self {
        Self::default()
    }

    /// Form data plus report identity, date and computed fields
    pub fn base_context(&self, form_data: &Context, plugin: &PluginConfig) -> Context {
        let mut context = form_data.clone();
        insert_missing(&mut context, "report_id", plugin.manifest.id.as_str());
        insert_missing(&mut context, "report_name", plugin.manifest.name.as_str());
        insert_missing(&mut context, "today", Local::now().date_naive());

        for field in plugin.all_fields().filter(|f| f.computed) {
            match plugin.general.setting(&field.id) {
                Some(value) => insert_missing(&mut context, &field.id, value),
                None => log::debug!("No setting for computed field '{}'", field.id),
            }
        }
        context
    }

    /// Select each block and render its template into the context.
    ///
    /// Blocks see the context as left by the blocks before them. A block
    /// with no matching rule renders as an empty string.
    pub fn apply_blocks(&self, context: &mut Context, plugin: &PluginConfig) {
        for block in &plugin.blocks {
            let text = match select_block(block, context) {
                Some(template) => self.renderer.render_lenient(template, context),
                None => String::new(),
            };
            context.insert(block.id.clone(), text);
        }
    }
}

impl ReportHandler for StandardHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn build_context(
        &self,
        form_data: &Context,
        plugin: &PluginConfig,
    ) -> Result<Context, DossierError> {
        let mut context = self.base_context(form_data, plugin);
        self.apply_blocks(&mut context, plugin);
        Ok(context)
    }
}

/// Audit opinion report: the standard context plus the opinion heading
/// (`opinion_heading`), the report date spelled out in Spanish
/// (`report_date_long`) and the signing city from the `ciudad` setting
/// (`ciudad`), all available to blocks.
#[derive(Debug, Clone, Default)]
pub struct AuditOpinionHandler {
    standard: StandardHandler,
}

impl AuditOpinionHandler {
    pub const NAME: &'static str = "audit_opinion";

    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportHandler for AuditOpinionHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn build_context(
        &self,
        form_data: &Context,
        plugin: &PluginConfig,
    ) -> Result<Context, DossierError> {
        let mut context = self.standard.base_context(form_data, plugin);

        let opinion = context
            .get("tipo_opinion")
            .map(Value::to_string)
            .unwrap_or_default();
        context.insert("opinion_heading", opinion_heading(&opinion));

        let date = context
            .get("fecha_informe")
            .and_then(as_date)
            .unwrap_or_else(|| Local::now().date_naive());
        context.insert("report_date_long", long_spanish_date(date));

        if let Some(city) = plugin.general.setting("ciudad") {
            insert_missing(&mut context, "ciudad", city);
        }

        self.standard.apply_blocks(&mut context, plugin);
        Ok(context)
    }
}

fn insert_missing(context: &mut Context, key: &str, value: impl Into<Value>) {
    if !context.contains_key(key) {
        context.insert(key, value);
    }
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => match Value::parse_scalar(s) {
            Value::Date(d) => Some(d),
            _ => None,
        },
        _ => None,
    }
}

/// Section heading for an opinion type
pub fn opinion_heading(opinion: &str) -> &'static str {
    match opinion {
        "favorable" => "Opinión favorable",
        "con_salvedades" => "Opinión con salvedades",
        "desfavorable" | "adversa" => "Opinión desfavorable",
        "denegada" => "Denegación de opinión",
        _ => "Opinión",
    }
}

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// `31 de marzo de 2024`
pub fn long_spanish_date(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::blocks::{BlockDefinition, BlockRule};
    use crate::engine::field::{FieldDefinition, FieldKind};
    use crate::platform::types::{GeneralConfig, Manifest, ManifestPaths};
    use serde_json::json;
    use std::path::PathBuf;

    fn plugin(blocks: Vec<BlockDefinition>) -> PluginConfig {
        PluginConfig {
            manifest: Manifest {
                id: AUDIT_REPORT_ID.to_string(),
                name: "Informe de auditoría".to_string(),
                version: "1.0.0".to_string(),
                description: None,
                author: None,
                paths: ManifestPaths {
                    template: "templates/informe.txt".to_string(),
                    config: None,
                },
            },
            dir: PathBuf::from("reports/informe_auditoria"),
            fields: Vec::new(),
            variables: Vec::new(),
            blocks,
            general: GeneralConfig::default(),
        }
    }

    #[test]
    fn test_standard_context() {
        let form: Context = [("entidad", "ACME")].into_iter().collect();
        let ctx = StandardHandler::new()
            .build_context(&form, &plugin(Vec::new()))
            .unwrap();

        assert_eq!(ctx.get("entidad"), Some(&Value::from("ACME")));
        assert_eq!(ctx.get("report_id"), Some(&Value::from(AUDIT_REPORT_ID)));
        assert!(matches!(ctx.get("today"), Some(Value::Date(_))));
    }

    #[test]
    fn test_standard_keeps_answers() {
        let form: Context = [("report_name", "Personalizado")].into_iter().collect();
        let ctx = StandardHandler::new()
            .build_context(&form, &plugin(Vec::new()))
            .unwrap();
        assert_eq!(ctx.get("report_name"), Some(&Value::from("Personalizado")));
    }

    #[test]
    fn test_blocks_rendered_in_order() {
        let blocks = vec![
            BlockDefinition::new(
                "parrafo_opinion",
                vec![
                    BlockRule::new("tipo_opinion == 'favorable'", "{{ entidad }} presenta fielmente"),
                    BlockRule::new("true", "Salvo por lo indicado, {{ entidad }}"),
                ],
            ),
            BlockDefinition::new("cierre", vec![BlockRule::new("true", "[{{ parrafo_opinion }}]")]),
            BlockDefinition::new("nada", vec![BlockRule::new("false", "x")]),
        ];
        let form: Context = [("entidad", "ACME"), ("tipo_opinion", "favorable")]
            .into_iter()
            .collect();

        let ctx = StandardHandler::new()
            .build_context(&form, &plugin(blocks))
            .unwrap();

        assert_eq!(
            ctx.get("parrafo_opinion"),
            Some(&Value::from("ACME presenta fielmente"))
        );
        assert_eq!(ctx.get("cierre"), Some(&Value::from("[ACME presenta fielmente]")));
        assert_eq!(ctx.get("nada"), Some(&Value::from("")));
    }

    #[test]
    fn test_audit_handler_extras() {
        let blocks = vec![BlockDefinition::new(
            "titulo",
            vec![BlockRule::new("true", "{{ opinion_heading }} ({{ report_date_long }})")],
        )];
        let form: Context = [
            ("tipo_opinion", Value::from("con_salvedades")),
            ("fecha_informe", Value::parse_scalar("2024-03-31")),
        ]
        .into_iter()
        .collect();

        let ctx = AuditOpinionHandler::new()
            .build_context(&form, &plugin(blocks))
            .unwrap();

        assert_eq!(
            ctx.get("titulo"),
            Some(&Value::from("Opinión con salvedades (31 de marzo de 2024)"))
        );
    }

    fn with_settings(mut plugin: PluginConfig) -> PluginConfig {
        plugin.general.extra.insert("ciudad".to_string(), json!("Madrid"));
        plugin.general.extra.insert("numero_roac".to_string(), json!("S0702"));
        plugin.fields = vec![
            FieldDefinition::new("auditor", FieldKind::Text),
            FieldDefinition::new("numero_roac", FieldKind::Text).computed(),
            FieldDefinition::new("sello", FieldKind::Text).computed(),
        ];
        plugin
    }

    #[test]
    fn test_computed_fields_from_settings() {
        let plugin = with_settings(plugin(Vec::new()));
        let ctx = StandardHandler::new()
            .build_context(&Context::new(), &plugin)
            .unwrap();

        assert_eq!(ctx.get("numero_roac"), Some(&Value::from("S0702")));
        // no setting, nothing derived
        assert_eq!(ctx.get("sello"), None);
        // plain settings stay out of the standard context
        assert_eq!(ctx.get("ciudad"), None);
    }

    #[test]
    fn test_audit_handler_city() {
        let blocks = vec![BlockDefinition::new(
            "firma",
            vec![BlockRule::new("true", "{{ ciudad }}, ROAC {{ numero_roac }}")],
        )];
        let plugin = with_settings(plugin(blocks));

        let ctx = AuditOpinionHandler::new()
            .build_context(&Context::new(), &plugin)
            .unwrap();
        assert_eq!(ctx.get("firma"), Some(&Value::from("Madrid, ROAC S0702")));

        let form: Context = [("ciudad", "Sevilla")].into_iter().collect();
        let ctx = AuditOpinionHandler::new()
            .build_context(&form, &plugin)
            .unwrap();
        assert_eq!(ctx.get("ciudad"), Some(&Value::from("Sevilla")));
    }

    #[test]
    fn test_opinion_heading() {
        assert_eq!(opinion_heading("favorable"), "Opinión favorable");
        assert_eq!(opinion_heading("adversa"), "Opinión desfavorable");
        assert_eq!(opinion_heading("denegada"), "Denegación de opinión");
        assert_eq!(opinion_heading(""), "Opinión");
    }

    #[test]
    fn test_long_spanish_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        assert_eq!(long_spanish_date(date), "7 de enero de 2025");
    }
}
