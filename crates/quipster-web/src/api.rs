//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use quipster_agent::ProbeReport;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness check.
pub async fn health() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// GET /probe
// ---------------------------------------------------------------------------

/// Response payload for the `/probe` endpoint.
#[derive(Serialize)]
pub struct ProbeResponse {
    #[serde(flatten)]
    pub report: ProbeReport,
    pub checked_at: DateTime<Utc>,
}

/// Send a tiny generation to the primary model and report the raw outcome.
///
/// Any HTTP status from the provider is reported with `200`; only a
/// transport failure yields `500`.
pub async fn probe(State(state): State<Arc<AppState>>) -> Response {
    match state.client.probe().await {
        Ok(report) => {
            tracing::info!(
                model = %report.model,
                status = report.status,
                ok = report.ok,
                "provider probe finished"
            );
            Json(ProbeResponse {
                report,
                checked_at: Utc::now(),
            })
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "provider probe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
