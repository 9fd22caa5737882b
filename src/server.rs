//! HTTP front door.
//!
//! Exposes the fallback search and an engine health probe as a small JSON API
//! consumed by the workflow orchestrator.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/v1/search` | Validate and run a tenant-first search |
//! | `GET`  | `/api/v1/health` | Engine health probe (also at `/health`) |
//! | `GET`  | `/` | Service banner with version and endpoints |
//!
//! # Envelopes
//!
//! Success: `{ "success": true, "data": { ... } }`
//!
//! Failure:
//!
//! ```json
//! { "success": false, "error": "Validation failed",
//!   "details": [{ "field": "slug", "message": "slug is required" }] }
//! ```
//!
//! | Status | `error` | Extra fields |
//! |--------|---------|--------------|
//! | 400 | `Validation failed` | `details` |
//! | 400 | `Invalid JSON body` | `message` |
//! | 404 | `Not found` | `path` (unknown path or wrong method) |
//! | 500 | `Internal server error` | `message` outside production |
//!
//! Internal errors are always logged in full; the response only carries the
//! real message when the server is not running in production.
//!
//! # Shutdown
//!
//! SIGINT or SIGTERM stops accepting connections and drains in-flight
//! requests. A second signal during the drain exits immediately.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::Config;
use crate::engine::{probe_health, MeilisearchClient, SearchEngine};
use crate::fallback::FallbackSearch;
use crate::models::{EngineHealth, HealthState, HealthStatus};
use crate::validate::{validate_search_request, FieldError};
use crate::SERVICE_NAME;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    search: Arc<FallbackSearch>,
}

impl AppState {
    pub fn new(config: &Config, engine: Arc<dyn SearchEngine>) -> Self {
        Self {
            search: Arc::new(FallbackSearch::new(engine, &config.indexes)),
            config: Arc::new(config.clone()),
        }
    }
}

/// Start the gateway against the configured Meilisearch engine.
///
/// Fails before binding if the engine client cannot be built, most notably
/// when `MEILISEARCH_API_KEY` is missing.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let engine = MeilisearchClient::new(&config.engine)
        .context("failed to create Meilisearch client")?;
    tracing::info!(
        engine = %engine.base_url(),
        timeout_ms = config.engine.timeout_ms,
        "engine client ready"
    );
    run_server_with_engine(config, Arc::new(engine)).await
}

/// Start the gateway with an already-constructed engine handle.
///
/// Runs until SIGINT/SIGTERM, then drains in-flight requests.
pub async fn run_server_with_engine(
    config: &Config,
    engine: Arc<dyn SearchEngine>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr();
    let app = router(AppState::new(config, engine));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        addr = %bind_addr,
        global_index = %config.indexes.global_index,
        local_prefix = %config.indexes.local_prefix,
        environment = %config.server.environment,
        "search gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("search gateway stopped");
    Ok(())
}

/// Build the router with all routes and layers.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/api/v1/search", post(handle_search))
        .route("/api/v1/health", get(handle_health))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .method_not_allowed_fallback(handle_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

/// Error type that converts into the failure envelope.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: String,
    message: Option<String>,
    details: Option<Vec<FieldError>>,
    path: Option<String>,
}

impl AppError {
    fn new(status: StatusCode, error: &str) -> Self {
        Self {
            status,
            error: error.to_string(),
            message: None,
            details: None,
            path: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.error,
            message: self.message,
            details: self.details,
            path: self.path,
        };
        (self.status, Json(body)).into_response()
    }
}

fn validation_failed(details: Vec<FieldError>) -> AppError {
    AppError {
        details: Some(details),
        ..AppError::new(StatusCode::BAD_REQUEST, "Validation failed")
    }
}

fn invalid_json(message: impl Into<String>) -> AppError {
    AppError {
        message: Some(message.into()),
        ..AppError::new(StatusCode::BAD_REQUEST, "Invalid JSON body")
    }
}

fn not_found(path: &str) -> AppError {
    AppError {
        path: Some(path.to_string()),
        ..AppError::new(StatusCode::NOT_FOUND, "Not found")
    }
}

/// 500 envelope. `detail` is only set outside production.
fn internal_error(detail: Option<String>) -> AppError {
    AppError {
        message: detail,
        ..AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "request handler panicked");
    internal_error(None).into_response()
}

// ============ GET / ============

async fn handle_root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "search": "POST /api/v1/search",
            "health": "GET /api/v1/health"
        }
    }))
}

// ============ POST /api/v1/search ============

#[derive(Serialize)]
struct SuccessBody<T> {
    success: bool,
    data: T,
}

/// Handler for `POST /api/v1/search`.
///
/// Validation runs first; the fallback search is never touched when any
/// field is invalid.
async fn handle_search(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected search body");
        invalid_json(rejection.body_text())
    })?;

    let request = validate_search_request(&body).map_err(|errors| {
        tracing::debug!(violations = errors.len(), "search request failed validation");
        validation_failed(errors)
    })?;

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!(
        "search",
        %request_id,
        tenant = %request.tenant_id,
        limit = request.limit,
        offset = request.offset
    );

    match state.search.resolve(&request).instrument(span).await {
        Ok(result) => Ok(Json(SuccessBody {
            success: true,
            data: result,
        })
        .into_response()),
        Err(e) => {
            tracing::error!(%request_id, error = %e, "search failed");
            let detail = if state.config.server.is_production() {
                None
            } else {
                Some(e.to_string())
            };
            Err(internal_error(detail))
        }
    }
}

// ============ GET /api/v1/health ============

/// JSON body for the health endpoints.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub success: bool,
    pub service: &'static str,
    pub status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meilisearch: Option<EngineHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Map a probe result onto an HTTP status and response body.
pub fn health_report(status: HealthStatus) -> (StatusCode, HealthBody) {
    let state = status.state();
    let timestamp = Utc::now().to_rfc3339();

    match status {
        HealthStatus::Healthy(engine) => (
            StatusCode::OK,
            HealthBody {
                success: true,
                service: SERVICE_NAME,
                status: state,
                meilisearch: Some(engine),
                error: None,
                timestamp,
            },
        ),
        HealthStatus::Unhealthy(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthBody {
                success: false,
                service: SERVICE_NAME,
                status: state,
                meilisearch: None,
                error: Some(error),
                timestamp,
            },
        ),
    }
}

async fn handle_health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    let (status, body) = health_report(probe_health(state.search.engine().as_ref()).await);
    (status, Json(body))
}

// ============ Fallback ============

async fn handle_not_found(uri: Uri) -> AppError {
    tracing::debug!(path = %uri.path(), "route not found");
    not_found(uri.path())
}

// ============ Shutdown ============

async fn shutdown_signal() {
    wait_for_signal().await;
    tracing::info!("shutdown signal received, draining in-flight requests");

    tokio::spawn(async {
        wait_for_signal().await;
        tracing::warn!("second shutdown signal received, exiting immediately");
        std::process::exit(130);
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
