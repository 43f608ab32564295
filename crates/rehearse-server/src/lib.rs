//! Rehearse server library logic.

pub mod api;
pub mod api_questions;
pub mod api_realtime;
pub mod config;
pub mod middleware;

use config::Config;
use rehearse_db::DbPool;
use rehearse_identity::SessionVerifier;
use rehearse_voice::RealtimeService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Verifies identity-provider session tokens.
    pub sessions: Arc<SessionVerifier>,
    /// Mints realtime voice credentials.
    pub realtime: Arc<RealtimeService>,
    /// Pre-built client bundle served for unmatched paths, if any.
    pub client_dir: Option<PathBuf>,
}

/// Failures while assembling [`AppState`] at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create database pool: {0}")]
    Pool(#[from] rehearse_db::PoolError),
    #[error("failed to get database connection: {0}")]
    Connection(#[from] r2d2::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(#[from] rehearse_db::MigrationError),
    #[error("invalid auth configuration: {0}")]
    Identity(#[from] rehearse_identity::IdentityError),
    #[error("invalid realtime configuration: {0}")]
    Voice(#[from] rehearse_voice::VoiceError),
}

impl AppState {
    /// Opens the database, applies pending migrations and builds the
    /// session verifier and realtime service from `config`.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let pool = rehearse_db::create_pool(
            &config.database.path,
            config.database.runtime_settings(),
        )?;

        {
            let conn = pool.get()?;
            let applied = rehearse_db::run_migrations(&conn)?;
            if applied > 0 {
                tracing::info!(count = applied, "applied database migrations");
            }
        }

        let sessions = SessionVerifier::from_config(&config.auth)?;
        let realtime = RealtimeService::new(config.realtime.clone())?;
        if !realtime.is_enabled() {
            tracing::warn!("no realtime API key configured, /realtime-key will fail");
        }

        Ok(Self {
            pool,
            sessions: Arc::new(sessions),
            realtime: Arc::new(realtime),
            client_dir: config.server.client_dir.as_ref().map(PathBuf::from),
        })
    }
}

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn client_fallback(router: Router, client_dir: Option<&Path>) -> Router {
    let Some(dir) = client_dir else {
        return router;
    };

    let index = dir.join("index.html");
    if index.exists() {
        tracing::info!(path = %dir.display(), "serving client static files");
        router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
    } else {
        tracing::info!(path = %dir.display(), "client directory has no index.html, skipping static file serving");
        router
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/questions", post(api_questions::create_question_handler))
        .route("/questions/{id}/vote", put(api_questions::vote_handler))
        .route("/realtime-key", post(api_realtime::realtime_key_handler))
        .route_layer(axum::middleware::from_fn(middleware::auth_middleware));

    let public_routes = Router::new()
        .route("/questions", get(api_questions::list_questions_handler))
        .route_layer(axum::middleware::from_fn(
            middleware::optional_auth_middleware,
        ));

    let router = Router::new()
        .route("/health", get(health))
        .merge(protected_routes)
        .merge(public_routes);

    let router = client_fallback(router, state.client_dir.as_deref());

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
