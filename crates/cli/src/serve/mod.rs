//! `sitelog serve` -- HTTP JSON API for the draft reconciliation store.
//!
//! Exposes the per-owner, per-period draft store as an async HTTP service
//! using `axum` + `tokio`. Supports concurrent request handling.
//!
//! Security features:
//! - Bearer-token authentication; every token resolves to an owner id and
//!   the owner used for store operations is never read from the request
//! - CORS headers on all responses (permissive for local dev)
//! - Per-owner rate limiting (default: 60 req/min, configurable)
//!
//! Endpoints:
//! - GET    /health   - Server status (exempt from auth)
//! - POST   /draft    - Save (upsert) the caller's draft for a period
//! - GET    /draft    - Load the caller's draft for a period
//! - DELETE /draft    - Delete the caller's draft for a period
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod middleware;
mod state;
mod tokens;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use sitelog_sqlite::SqliteDraftStore;
use sitelog_storage::{DraftStorage, MemoryDraftStore};

use self::handlers::{
    handle_delete_draft, handle_health, handle_load_draft, handle_not_found, handle_save_draft,
};
use self::middleware::{auth_middleware, rate_limit_middleware};
use self::state::{AppState, RateLimiter};

/// Maximum request body size: 2 MB. A month of labor-sheet rows is far
/// smaller; anything bigger is a misbehaving client.
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Default rate limit: 60 requests per minute per owner.
const DEFAULT_RATE_LIMIT: u64 = 60;

/// Rate limit window duration in seconds (1 minute).
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Start the HTTP server on the given port.
///
/// With `db_path` set, drafts persist to SQLite; otherwise they live in an
/// in-memory store and are lost on shutdown. The token registry comes from
/// the `tokens_path` TOML file or, failing that, the `SITELOG_TOKENS` env
/// var; without any tokens the server refuses to start, since every draft
/// operation requires an authenticated owner.
pub async fn start_server(
    port: u16,
    db_path: Option<PathBuf>,
    tokens_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = match tokens_path {
        Some(path) => tokens::load_token_file(&path)?,
        None => match std::env::var("SITELOG_TOKENS") {
            Ok(raw) => tokens::parse_token_env(&raw)?,
            Err(_) => {
                return Err("no tokens configured: pass --tokens or set SITELOG_TOKENS".into())
            }
        },
    };
    eprintln!("Token registry: {} token(s) loaded", tokens.len());

    let store: Arc<dyn DraftStorage> = match &db_path {
        Some(path) => {
            eprintln!("Draft store: sqlite at {}", path.display());
            Arc::new(SqliteDraftStore::open(path)?)
        }
        None => {
            eprintln!("Draft store: in-memory (drafts are lost on shutdown)");
            Arc::new(MemoryDraftStore::new())
        }
    };

    // Rate limit: from SITELOG_RATE_LIMIT env var, or default
    let rate_limit = std::env::var("SITELOG_RATE_LIMIT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT);
    eprintln!("Rate limit: {} requests per minute per owner", rate_limit);

    let state = Arc::new(AppState {
        store,
        tokens,
        rate_limiter: RateLimiter::new(rate_limit),
    });

    // CORS: permissive for local dev; tighten for production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    // Layer order: the last layer added runs first, so requests pass through
    // CORS, then auth (resolving the owner), then the per-owner rate limit.
    let app = Router::new()
        .route("/health", get(handle_health))
        .route(
            "/draft",
            get(handle_load_draft)
                .post(handle_save_draft)
                .delete(handle_delete_draft),
        )
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("Sitelog draft service listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    eprintln!("\nReceived shutdown signal...");
}
