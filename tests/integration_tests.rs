//! Integration tests for report loading, form passes and generation
//!
//! These run against the `informe_auditoria` plugin shipped in `reports/`.

use dossier_rs::engine::accumulator::{accumulate, FormLayout};
use dossier_rs::engine::blocks::select_all_blocks;
use dossier_rs::engine::condition::{evaluate, evaluate_all, evaluate_any};
use dossier_rs::engine::field::{FieldDefinition, FieldDependency, FieldKind};
use dossier_rs::engine::visibility::should_show;
use dossier_rs::engine::{Context, Value};
use dossier_rs::platform::answers::PresetAnswers;
use dossier_rs::platform::handlers::AUDIT_REPORT_ID;
use dossier_rs::platform::session::preview;
use dossier_rs::platform::{
    DocumentRenderer, PluginConfig, PluginLoader, ReportRegistry, ReportSession,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

fn reports_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("reports")
}

fn audit_plugin() -> PluginConfig {
    PluginLoader::new(reports_dir())
        .load_plugin(AUDIT_REPORT_ID)
        .unwrap()
}

fn audit_session() -> ReportSession {
    let registry = ReportRegistry::with_builtins();
    ReportSession::new(Arc::new(audit_plugin()), registry.resolve(AUDIT_REPORT_ID))
}

fn answers(yaml: &str) -> PresetAnswers {
    PresetAnswers::parse(yaml).unwrap()
}

// ============================================================================
// Plugin Loading Tests
// ============================================================================

#[test]
fn test_shipped_report_is_listed() {
    let loader = PluginLoader::new(reports_dir());
    let ids: Vec<String> = loader.list_available().into_iter().map(|m| m.id).collect();
    assert!(ids.contains(&AUDIT_REPORT_ID.to_string()));
    assert!(PluginLoader::validate_structure(reports_dir().join(AUDIT_REPORT_ID)).is_empty());
}

#[test]
fn test_shipped_report_layout() {
    let plugin = audit_plugin();

    assert_eq!(plugin.manifest.name, "Informe de auditoría de cuentas anuales");
    assert_eq!(
        plugin.layout().section_names(),
        vec!["Tipo de opinión", "Datos de la entidad", "Salvedades", "Firma"]
    );
    assert_eq!(plugin.blocks.len(), 3);
    assert_eq!(plugin.general.setting("ciudad"), Some("Madrid"));
    assert!(PluginLoader::template_path(&plugin).is_ok());
}

// ============================================================================
// Form Pass Tests
// ============================================================================

#[test]
fn test_favorable_hides_qualification_fields() {
    let mut session = audit_session();
    let outcome = session
        .fill(&mut answers("entidad: ACME\nejercicio: 2023\nauditor: Ana Ruiz\n"))
        .unwrap();

    let shown = outcome.shown_fields();
    assert_eq!(
        shown,
        vec![
            "tipo_opinion",
            "incertidumbre_empresa_funcionamiento",
            "entidad",
            "ejercicio",
            "organo",
            "auditor",
            "fecha_informe",
        ]
    );
    assert_eq!(
        session.form_data().get("tipo_opinion"),
        Some(&Value::from("favorable"))
    );
    assert!(session.validate().is_empty());
}

#[test]
fn test_qualified_opinion_requires_description() {
    let mut session = audit_session();
    let outcome = session
        .fill(&mut answers(
            "tipo_opinion: con_salvedades\nentidad: ACME\nejercicio: 2023\nauditor: Ana Ruiz\n",
        ))
        .unwrap();

    let shown = outcome.shown_fields();
    assert!(shown.contains(&"descripcion_salvedad"));
    assert!(shown.contains(&"importe_salvedad"));
    assert!(!shown.contains(&"motivo_denegacion"));
    assert!(!shown.contains(&"numero_roac"));

    assert_eq!(
        session.validate(),
        vec!["'Descripción de la salvedad' is required"]
    );
}

#[test]
fn test_going_concern_note_follows_variable() {
    let mut session = audit_session();
    session
        .fill(&mut answers(
            "incertidumbre_empresa_funcionamiento: si\nentidad: ACME\nejercicio: 2023\nauditor: A\n",
        ))
        .unwrap();

    assert_eq!(
        session.validate(),
        vec!["'Nota de la memoria sobre la incertidumbre' is required"]
    );
}

#[test]
fn test_out_of_range_year() {
    let mut session = audit_session();
    session
        .fill(&mut answers("entidad: ACME\nejercicio: 1800\nauditor: A\n"))
        .unwrap();
    assert_eq!(
        session.validate(),
        vec!["'Ejercicio auditado' must be at least 1900"]
    );
}

#[test]
fn test_sequential_pass_sees_answers_in_order() {
    let tipo = FieldDefinition::new("tipo", FieldKind::Radio).with_options(["yes", "no"]);
    let detalle = FieldDefinition::new("detalle", FieldKind::Text)
        .with_dependency(FieldDependency::equals("tipo", "yes"));
    let preset = "tipo: \"yes\"\ndetalle: visto\n";

    let layout = FormLayout::group(vec![tipo.clone(), detalle.clone()], &[]);
    let outcome = accumulate(&layout, Context::new(), &mut answers(preset)).unwrap();
    assert_eq!(outcome.values.get("detalle"), Some(&Value::from("visto")));

    let layout = FormLayout::group(vec![detalle, tipo], &[]);
    let outcome = accumulate(&layout, Context::new(), &mut answers(preset)).unwrap();
    assert_eq!(outcome.values.get("detalle"), None);
}

// ============================================================================
// Generation Tests
// ============================================================================

#[test]
fn test_generate_favorable_report() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = audit_session();
    session
        .fill(&mut answers(
            r#"
entidad: ACME S.A.
ejercicio: 2023
organo: Consejo de Administración
auditor: Ana Ruiz
fecha_informe: 2024-03-31
"#,
        ))
        .unwrap();

    let report = session
        .generate(&DocumentRenderer::new(), tmp.path())
        .unwrap();
    let document = fs::read_to_string(&report.document_path).unwrap();

    assert!(document.starts_with("INFORME DE AUDITORÍA"));
    assert!(document.contains("A los accionistas de ACME S.A., por encargo del Consejo de Administración:"));
    assert!(document.contains("Opinión favorable"));
    assert!(document.contains("imagen fiel del patrimonio"));
    assert!(document.contains("31 de diciembre de 2023"));
    assert!(document.contains("Ana Ruiz (ROAC n.º S0702)"));
    assert!(document.contains("Madrid, 31 de marzo de 2024"));
    assert!(!document.contains("Incertidumbre material"));

    let name = report.document_path.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("informe_auditoria_"));
    assert!(name.ends_with(".txt"));

    let metadata: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report.metadata_path).unwrap()).unwrap();
    assert_eq!(metadata["report_id"], AUDIT_REPORT_ID);
    assert_eq!(metadata["version"], "1.0.0");
    assert_eq!(metadata["form_data"]["ejercicio"], 2023);
    assert_eq!(metadata["form_data"]["fecha_informe"], "2024-03-31");
    assert_eq!(metadata["blocks"]["empresa_en_funcionamiento"], "");
    assert_eq!(metadata["document"], document.as_str());
}

#[test]
fn test_generate_denied_report_with_going_concern() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = audit_session();
    session
        .fill(&mut answers(
            r#"
tipo_opinion: denegada
incertidumbre_empresa_funcionamiento: si
entidad: ACME
ejercicio: 2023
auditor: Ana Ruiz
motivo_denegacion: No hemos podido obtener evidencia suficiente.
nota_incertidumbre: "2.3"
"#,
        ))
        .unwrap();

    let report = session
        .generate(&DocumentRenderer::new(), tmp.path())
        .unwrap();
    let document = &report.metadata.document;

    assert!(document.contains("Denegación de opinión"));
    assert!(document.contains("No expresamos una opinión"));
    assert!(document.contains("No hemos podido obtener evidencia suficiente."));
    // the going-concern block is excluded for denied opinions
    assert!(!document.contains("Llamamos la atención"));
}

#[test]
fn test_preview_selects_blocks() {
    let plugin = audit_plugin();
    let registry = ReportRegistry::with_builtins();
    let handler = registry.resolve(AUDIT_REPORT_ID);

    let result = preview(
        &plugin,
        handler.as_ref(),
        &mut answers(
            "tipo_opinion: con_salvedades\nentidad: ACME\nejercicio: 2023\ndescripcion_salvedad: Existencias sin inventariar.\nimporte_salvedad: 1500\n",
        ),
    )
    .unwrap();

    assert!(result.blocks["parrafo_opinion"].contains("excepto por los efectos"));
    assert_eq!(
        result.blocks["fundamento"],
        "Existencias sin inventariar. El importe afectado asciende a 1500 euros."
    );
    assert_eq!(result.errors, vec!["'Auditor firmante' is required"]);
}

// ============================================================================
// Engine Properties
// ============================================================================

#[test]
fn test_evaluate_never_fails_on_hostile_input() {
    let ctx: Context = [("tipo_opinion", "favorable")].into_iter().collect();
    let inputs = [
        "",
        "__import__('os').system('ls')",
        "tipo_opinion.upper() == 'FAVORABLE'",
        "tipo_opinion == ",
        "((((((",
        "'unterminated",
        "x ==== y",
        "desconocida == 1",
    ];
    for input in inputs {
        assert!(!evaluate(input, &ctx), "{:?} should be false", input);
    }

    let deep = format!("{}true{}", "(".repeat(500), ")".repeat(500));
    assert!(!evaluate(&deep, &ctx));
}

#[test]
fn test_vacuous_truth() {
    let ctx = Context::new();
    let none: [&str; 0] = [];
    assert!(evaluate_all(&none, &ctx));
    assert!(!evaluate_any(&none, &ctx));
}

#[test]
fn test_block_and_visibility_against_shipped_config() {
    let plugin = audit_plugin();
    let ctx: Context = [("tipo_opinion", "desfavorable"), ("importe_salvedad", "900")]
        .into_iter()
        .collect();

    let blocks = select_all_blocks(&plugin.blocks, &ctx);
    assert!(blocks["parrafo_opinion"].contains("no expresan la imagen fiel"));
    assert_eq!(blocks["empresa_en_funcionamiento"], "");

    let importe = plugin
        .fields
        .iter()
        .find(|f| f.id == "importe_salvedad")
        .unwrap();
    assert!(should_show(importe, &ctx));

    let descripcion = plugin
        .fields
        .iter()
        .find(|f| f.id == "descripcion_salvedad")
        .unwrap();
    assert!(!should_show(descripcion, &ctx));
}
