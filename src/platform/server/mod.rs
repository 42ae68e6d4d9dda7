// SPDX-License-Identifier: MIT

//! HTTP API over reports, sessions and the condition evaluator

mod sessions;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use super::answers::PresetAnswers;
use super::config::PlatformConfig;
use super::loader::PluginLoader;
use super::registry::ReportRegistry;
use super::render::{template_variables, DocumentRenderer, GeneratedReport};
use super::session::{preview, Preview, ReportSession};
use super::types::PluginInfo;
use crate::engine::accumulator::{FormOutcome, Section};
use crate::engine::condition::{explain, ConditionReport};
use crate::engine::context::Context;
use crate::engine::error::DossierError;

pub use sessions::SessionStore;

/// Shared server state; sessions are the only mutable part
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PlatformConfig>,
    pub loader: Arc<PluginLoader>,
    pub registry: Arc<ReportRegistry>,
    pub renderer: Arc<DocumentRenderer>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: PlatformConfig, registry: ReportRegistry) -> Self {
        Self {
            loader: Arc::new(PluginLoader::new(&config.reports_dir)),
            sessions: Arc::new(SessionStore::new(config.session_ttl, config.max_sessions)),
            config: Arc::new(config),
            registry: Arc::new(registry),
            renderer: Arc::new(DocumentRenderer::new()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/reports", get(list_reports))
        .route("/api/reports/{id}", get(get_report))
        .route("/api/reports/{id}/preview", post(preview_report))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", delete(delete_session))
        .route("/api/sessions/{id}/answers", post(submit_answers))
        .route("/api/sessions/{id}/generate", post(generate_report))
        .route("/api/conditions/check", post(check_condition))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(config: PlatformConfig) -> Result<(), DossierError> {
    if tracing::subscriber::set_global_default(tracing_subscriber::fmt().finish()).is_err() {
        log::debug!("Tracing subscriber already installed");
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let app = build_router(AppState::new(config, ReportRegistry::with_builtins()));

    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `DossierError` rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: DossierError,
}

impl From<DossierError> for ApiError {
    fn from(error: DossierError) -> Self {
        let status = match &error {
            DossierError::ReportNotFound { .. } | DossierError::SessionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DossierError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DossierError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DossierError::TooManySessions(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, error }
    }
}

/// Body rejections keep axum's status (400, 415 or 422)
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            error: DossierError::InvalidRequest(rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("Request failed: {}", self.error);
        }
        (self.status, Json(json!({ "error": self.error.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// JSON body, or the rejection to report through [`ApiError`]
type JsonBody<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Serialize)]
struct ReportDetail {
    #[serde(flatten)]
    info: PluginInfo,
    handler: String,
    sections: Vec<Section>,
    blocks: Vec<String>,
    template_variables: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnswersRequest {
    #[serde(default)]
    answers: Context,
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    report_id: String,
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: Uuid,
    report_id: String,
}

#[derive(Debug, Serialize)]
struct SessionProgress {
    session_id: Uuid,
    #[serde(flatten)]
    outcome: FormOutcome,
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    condition: String,
    #[serde(default)]
    context: Context,
}

async fn health_check() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

async fn list_reports(State(state): State<AppState>) -> Json<Vec<PluginInfo>> {
    let reports = state
        .loader
        .list_available()
        .iter()
        .map(PluginInfo::from)
        .collect();
    Json(reports)
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ReportDetail> {
    let plugin = state.loader.load_plugin(&id)?;
    let template = PluginLoader::template_path(&plugin)
        .ok()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .unwrap_or_default();

    Ok(Json(ReportDetail {
        info: plugin.info(),
        handler: state.registry.resolve(&id).name().to_string(),
        sections: plugin.layout().sections().to_vec(),
        blocks: plugin.blocks.iter().map(|b| b.id.clone()).collect(),
        template_variables: template_variables(&template),
    }))
}

async fn preview_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<AnswersRequest>,
) -> ApiResult<Preview> {
    let Json(request) = body?;
    let plugin = state.loader.load_plugin(&id)?;
    let handler = state.registry.resolve(&id);
    let mut source = PresetAnswers::new(request.answers);
    Ok(Json(preview(&plugin, handler.as_ref(), &mut source)?))
}

async fn create_session(
    State(state): State<AppState>,
    body: JsonBody<CreateSessionRequest>,
) -> ApiResult<SessionCreated> {
    let Json(request) = body?;
    let plugin = state.loader.load_plugin(&request.report_id)?;
    let handler = state.registry.resolve(&request.report_id);
    let session_id = state
        .sessions
        .insert(ReportSession::new(Arc::new(plugin), handler))
        .await?;
    log::info!("Session {} created for {}", session_id, request.report_id);

    Ok(Json(SessionCreated {
        session_id,
        report_id: request.report_id,
    }))
}

async fn submit_answers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<AnswersRequest>,
) -> ApiResult<SessionProgress> {
    let Json(request) = body?;
    let session_id = parse_session_id(&id)?;
    let progress = state
        .sessions
        .with_session(session_id, |session| {
            let outcome = session.fill(&mut PresetAnswers::new(request.answers))?;
            Ok(SessionProgress {
                session_id,
                outcome,
                errors: session.validate(),
            })
        })
        .await?;
    Ok(Json(progress))
}

async fn generate_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<GeneratedReport> {
    let session_id = parse_session_id(&id)?;
    let output_dir = state.config.output_dir()?;
    let report = state
        .sessions
        .with_session(session_id, |session| {
            session.generate(&state.renderer, output_dir)
        })
        .await?;
    Ok(Json(report))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(&id)?;
    if !state.sessions.remove(session_id).await {
        return Err(DossierError::SessionNotFound(id).into());
    }
    log::info!("Session {} closed", session_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn check_condition(body: JsonBody<CheckRequest>) -> ApiResult<ConditionReport> {
    let Json(request) = body?;
    Ok(Json(explain(&request.condition, &request.context)))
}

fn parse_session_id(raw: &str) -> Result<Uuid, DossierError> {
    Uuid::parse_str(raw).map_err(|_| DossierError::SessionNotFound(raw.to_string()))
}
