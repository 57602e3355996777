use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{delete, get, post}, Json, Router};
use docrank::{DocId, Error as IndexError, Index, IndexStats, ScoringFunction, SearchHit};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub scoring: ScoringFunction,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub scoring: ScoringFunction,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Deserialize)]
pub struct IndexRequest {
    pub identifier: String,
    pub text: String,
    #[serde(default)]
    pub allow_overwrite: bool,
}

#[derive(Serialize)]
pub struct IndexResponse {
    pub identifier: String,
    pub doc_id: DocId,
}

type ApiError = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<RwLock<Index>>,
    pub admin_token: Option<String>,
}

/// Opens (or creates) the snapshot at `index_path` and builds the router.
/// `ADMIN_TOKEN` guards mutating routes; `CORS_ALLOW_ORIGIN` restricts origins.
pub fn build_app(index_path: String) -> Result<Router> {
    let index = Index::open(&index_path)?;
    tracing::info!(%index_path, num_docs = index.num_docs(), "index loaded");
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(AppState { index: Arc::new(RwLock::new(index)), admin_token }))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/search", get(search_handler))
        .route("/index", post(index_document))
        .route("/doc/:identifier", delete(remove_document))
        .route("/index/commit", post(index_commit))
        .route("/index/clear", post(index_clear))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let mut results = state.index.read().search(&params.q, params.scoring);
    let total_hits = results.len();
    results.truncate(params.k.clamp(1, 100));
    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, scoring: params.scoring, took_s: elapsed.as_secs_f64(), total_hits, results })
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.index.read().stats())
}

async fn index_document(State(state): State<AppState>, headers: HeaderMap, Json(req): Json<IndexRequest>) -> Result<Json<IndexResponse>, ApiError> {
    authorize(&state, &headers)?;
    let doc_id = state
        .index
        .write()
        .index_string(&req.text, &req.identifier, req.allow_overwrite)
        .map_err(api_error)?;
    Ok(Json(IndexResponse { identifier: req.identifier, doc_id }))
}

async fn remove_document(State(state): State<AppState>, headers: HeaderMap, Path(identifier): Path<String>) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.index.write().remove_document(&identifier).map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn index_commit(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<IndexStats>, ApiError> {
    authorize(&state, &headers)?;
    let index = state.index.read();
    index.commit().map_err(api_error)?;
    Ok(Json(index.stats()))
}

async fn index_clear(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.index.write().clear_all_data();
    Ok(StatusCode::NO_CONTENT)
}

fn api_error(err: IndexError) -> ApiError {
    let status = match &err {
        IndexError::NoSuchDocument(_) => StatusCode::NOT_FOUND,
        IndexError::DuplicateDocument(_) => StatusCode::CONFLICT,
        IndexError::MalformedPersistedIndex(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IndexError::NoSnapshotPath | IndexError::DocIdsExhausted | IndexError::Io(_) => {
            tracing::error!(error = %err, "index operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
