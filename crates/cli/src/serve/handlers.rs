//! HTTP route handlers: health and the draft save/load/delete boundary.
//!
//! Each draft handler wraps its single store call in one top-level match:
//! any storage fault maps to the generic failure envelope
//! `{ "success": false, "message": ... }` with HTTP 500. Absence of a draft
//! is a success, never a failure.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use sitelog_storage::{DraftPayload, StorageError};

use super::json_error;
use super::state::{AppState, Owner};

/// Request body for POST /draft. The payload fields are optional and
/// default to empty sequences; a save replaces all four wholesale.
#[derive(Deserialize)]
pub(crate) struct SaveDraftRequest {
    month: i32,
    year: i32,
    #[serde(flatten)]
    payload: DraftPayload,
}

/// Query parameters for load/delete. Month and year arrive as text;
/// a value that fails to parse behaves as "no match", not as an error.
#[derive(Deserialize)]
pub(crate) struct PeriodQuery {
    month: Option<String>,
    year: Option<String>,
}

impl PeriodQuery {
    fn parse(&self) -> Option<(i32, i32)> {
        let month = self.month.as_deref()?.trim().parse().ok()?;
        let year = self.year.as_deref()?.trim().parse().ok()?;
        Some((month, year))
    }
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "sitelog_version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// POST /draft
pub(crate) async fn handle_save_draft(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<Owner>,
    Json(body): Json<SaveDraftRequest>,
) -> Response {
    match state
        .store
        .save_draft(owner.0, body.month, body.year, body.payload)
        .await
    {
        Ok(record) => {
            let response = serde_json::json!({
                "success": true,
                "message": "draft saved",
                "record": record,
            });
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => storage_failure(e),
    }
}

/// GET /draft?month=&year=
pub(crate) async fn handle_load_draft(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<Owner>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let Some((month, year)) = query.parse() else {
        // Unparseable period text matches nothing.
        let response = serde_json::json!({ "success": true, "record": null });
        return (StatusCode::OK, Json(response)).into_response();
    };

    match state.store.load_draft(owner.0, month, year).await {
        Ok(record) => {
            let response = serde_json::json!({ "success": true, "record": record });
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => storage_failure(e),
    }
}

/// DELETE /draft?month=&year=
pub(crate) async fn handle_delete_draft(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<Owner>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let Some((month, year)) = query.parse() else {
        let response = serde_json::json!({
            "success": true,
            "message": "no draft for period",
            "deleted_count": 0,
        });
        return (StatusCode::OK, Json(response)).into_response();
    };

    match state.store.delete_draft(owner.0, month, year).await {
        Ok(deleted) => {
            let message = if deleted == 0 {
                "no draft for period"
            } else {
                "draft deleted"
            };
            let response = serde_json::json!({
                "success": true,
                "message": message,
                "deleted_count": deleted,
            });
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => storage_failure(e),
    }
}

/// Map any storage fault to the generic failure envelope.
fn storage_failure(e: StorageError) -> Response {
    let response = serde_json::json!({
        "success": false,
        "message": e.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::PeriodQuery;

    fn query(month: Option<&str>, year: Option<&str>) -> PeriodQuery {
        PeriodQuery {
            month: month.map(str::to_string),
            year: year.map(str::to_string),
        }
    }

    #[test]
    fn parses_numeric_period() {
        assert_eq!(query(Some("3"), Some("2024")).parse(), Some((3, 2024)));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(query(Some(" 3 "), Some(" 2024 ")).parse(), Some((3, 2024)));
    }

    #[test]
    fn malformed_month_matches_nothing() {
        assert_eq!(query(Some("march"), Some("2024")).parse(), None);
    }

    #[test]
    fn missing_year_matches_nothing() {
        assert_eq!(query(Some("3"), None).parse(), None);
    }
}
