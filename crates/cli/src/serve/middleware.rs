//! HTTP middleware: bearer-token authentication and per-owner rate limiting.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::state::{AppState, Owner};

/// Bearer-token authentication middleware.
///
/// Every endpoint except /health requires `Authorization: Bearer <token>`
/// with a token from the registry. The resolved owner id is stored in the
/// request extensions for the handlers and the rate limiter.
pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    // /health is exempt from auth (for load balancer health checks)
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = match token {
        Some(t) => t,
        None => {
            return super::json_error(StatusCode::UNAUTHORIZED, "authentication required")
                .into_response()
        }
    };

    match state.tokens.get(token) {
        Some(&owner_id) => {
            request.extensions_mut().insert(Owner(owner_id));
            next.run(request).await
        }
        None => super::json_error(StatusCode::FORBIDDEN, "invalid token").into_response(),
    }
}

/// Rate limiting middleware. Runs after auth and counts requests per owner.
pub(crate) async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    // Unauthenticated routes (/health) carry no owner and are not limited.
    let owner = match request.extensions().get::<Owner>() {
        Some(owner) => *owner,
        None => return next.run(request).await,
    };

    match state.rate_limiter.check(owner.0).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            let body = serde_json::json!({
                "error": "rate limit exceeded",
                "retry_after": retry_after,
            });
            (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
        }
    }
}
