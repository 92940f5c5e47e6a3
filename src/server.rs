//! Build-trigger HTTP server.
//!
//! ```text
//! GET /api/generator/build               → run one build, {"msg": "build complete"}
//! GET {prefix}/api-docs/openapi.json     → the last generated document
//! ```
//!
//! Builds are serialized: a trigger that arrives mid-build waits for the
//! running one to finish and then builds again.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use catalyst_codegen::OPENAPI_FILE;
use catalyst_core::{EngineResult, GeneratorSettings};
use catalyst_introspect::run_build;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const BUILD_ROUTE: &str = "/api/generator/build";

/// Runs one generation; returns the number of files written.
#[async_trait]
pub trait BuildRunner: Send + Sync + 'static {
    async fn build(&self) -> EngineResult<usize>;
}

/// Builds from the live database
pub struct PgBuildRunner {
    pool: PgPool,
    settings: GeneratorSettings,
    debug_sql: bool,
}

impl PgBuildRunner {
    pub fn new(pool: PgPool, settings: GeneratorSettings, debug_sql: bool) -> Self {
        Self {
            pool,
            settings,
            debug_sql,
        }
    }
}

#[async_trait]
impl BuildRunner for PgBuildRunner {
    async fn build(&self) -> EngineResult<usize> {
        let outcome = run_build(&self.pool, &self.settings, self.debug_sql).await?;
        Ok(outcome.project.file_count())
    }
}

#[derive(Clone)]
pub struct AppState {
    runner: Arc<dyn BuildRunner>,
    build_lock: Arc<Mutex<()>>,
    document: PathBuf,
}

impl AppState {
    pub fn new(runner: impl BuildRunner, settings: &GeneratorSettings) -> Self {
        Self {
            runner: Arc::new(runner),
            build_lock: Arc::new(Mutex::new(())),
            document: settings.output_dir.join(OPENAPI_FILE),
        }
    }
}

/// Docs route under the API mount prefix
pub fn docs_route(api_prefix: &str) -> String {
    format!("{}/api-docs/openapi.json", api_prefix.trim_end_matches('/'))
}

pub fn router(state: AppState, api_prefix: &str) -> Router {
    Router::new()
        .route(BUILD_ROUTE, get(trigger_build))
        .route(&docs_route(api_prefix), get(serve_document))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn trigger_build(State(state): State<AppState>) -> Response {
    let _guard = state.build_lock.lock().await;
    match state.runner.build().await {
        Ok(files) => {
            tracing::info!(files, "build triggered over HTTP");
            Json(json!({ "msg": "build complete" })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "build failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn serve_document(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.document).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "OpenAPI document not generated yet" })),
        )
            .into_response(),
    }
}
