//! Service health reporting.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde::Serialize;

use crate::server::AppState;

/// Health report returned by `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub providers: ProvidersHealth,
    #[serde(rename = "checkedAt")]
    pub checked_at: String,
}

/// Names of the providers the orchestrator is wired to
#[derive(Debug, Serialize)]
pub struct ProvidersHealth {
    pub chat: &'static str,
    pub search: &'static str,
}

/// Report the service as ready along with its configured providers
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "ready",
        providers: ProvidersHealth {
            chat: state.orchestrator.chat_provider(),
            search: state.orchestrator.search_provider(),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(response))
}
