use crate::envelope::ContextEnvelope;
use crate::manager::ManagerError;
use crate::registry::RegistrySummary;
use crate::render::RenderResult;
use crate::runtime::{Capabilities, HealthReport, Runtime};
use crate::view::{View, ViewUpdate};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Shared state for the query API
pub struct QueryAppState {
    pub runtime: Arc<Runtime>,
}

/// Query parameters for history requests
#[derive(Deserialize)]
pub struct HistoryParams {
    /// Max updates to return (default: 100, capped by `api.max_history_limit`)
    pub limit: Option<usize>,
}

/// Query parameters for render requests
#[derive(Deserialize)]
pub struct RenderParams {
    /// Adapter key (default: `render.default_adapter`)
    pub adapter: Option<String>,
}

/// View listing entry
#[derive(Serialize)]
pub struct ViewSummaryResponse {
    pub id: String,
    pub name: String,
    pub version: u64,
    pub component_count: usize,
    pub tags: Value,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl From<View> for ViewSummaryResponse {
    fn from(view: View) -> Self {
        Self {
            component_count: view.component_count(),
            tags: view.metadata.get("tags").cloned().unwrap_or(Value::Array(vec![])),
            updated_at: view.updated_at.to_rfc3339(),
            version: view.version,
            name: view.name,
            id: view.id,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create query API router
pub fn create_query_router(state: Arc<QueryAppState>) -> Router {
    Router::new()
        .route("/api/views", get(list_views))
        .route("/api/views/:id", get(get_view))
        .route("/api/views/:id/history", get(get_history))
        .route("/api/views/:id/render", get(render_view))
        .route("/api/components", get(list_components))
        .route("/api/health", get(health))
        .route("/api/capabilities", get(capabilities))
        .with_state(state)
}

/// GET /api/views - List all views, oldest first
async fn list_views(State(state): State<Arc<QueryAppState>>) -> Json<Vec<ViewSummaryResponse>> {
    let views = state.runtime.manager().list_views();
    Json(views.into_iter().map(ViewSummaryResponse::from).collect())
}

/// GET /api/views/:id - Full view with components
async fn get_view(
    State(state): State<Arc<QueryAppState>>,
    Path(id): Path<String>,
) -> Result<Json<View>, ApiError> {
    let view = state
        .runtime
        .manager()
        .get_view(&id)
        .ok_or(ApiError::ViewNotFound)?;
    Ok(Json(view))
}

/// GET /api/views/:id/history?limit=N
///
/// Returns the N most recent updates for the view, oldest first. Updates of a
/// deleted view stay visible until evicted.
async fn get_history(
    State(state): State<Arc<QueryAppState>>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<ViewUpdate>>, ApiError> {
    let max = state.runtime.config().api.max_history_limit;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(max);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be at least 1".to_string()));
    }
    Ok(Json(state.runtime.manager().history(Some(&id), limit)))
}

/// GET /api/views/:id/render?adapter=json
async fn render_view(
    State(state): State<Arc<QueryAppState>>,
    Path(id): Path<String>,
    Query(params): Query<RenderParams>,
) -> Result<Json<RenderResult>, ApiError> {
    let adapter = params
        .adapter
        .unwrap_or_else(|| state.runtime.config().render.default_adapter.clone());
    let ctx = ContextEnvelope::default().with_tool("render");

    state
        .runtime
        .manager()
        .render(&ctx, &id, &adapter)?
        .map(Json)
        .ok_or(ApiError::UnknownAdapter(adapter))
}

/// GET /api/components - Registered component definitions
async fn list_components(State(state): State<Arc<QueryAppState>>) -> Json<RegistrySummary> {
    Json(state.runtime.manager().registry().to_summary())
}

/// GET /api/health
async fn health(State(state): State<Arc<QueryAppState>>) -> Json<HealthReport> {
    Json(state.runtime.health())
}

/// GET /api/capabilities
async fn capabilities(State(state): State<Arc<QueryAppState>>) -> Json<Capabilities> {
    Json(state.runtime.capabilities())
}

/// Query error types
#[derive(Debug)]
enum ApiError {
    ViewNotFound,
    UnknownAdapter(String),
    BadRequest(String),
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::ViewNotFound(_) => ApiError::ViewNotFound,
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::ViewNotFound => (StatusCode::NOT_FOUND, "View not found".to_string()),
            ApiError::UnknownAdapter(adapter) => (
                StatusCode::BAD_REQUEST,
                format!("Unknown render adapter '{adapter}'"),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
