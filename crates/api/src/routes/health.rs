use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Why the check failed, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub uptime_seconds: u64,
    /// Requests served since startup, this one included.
    pub api_requests: u64,
}

/// GET /health -- the same check the registry heartbeat reports.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let outcome = state.health.check().await;
    let status = if outcome.healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy: outcome.healthy,
        reason: outcome.reason,
        uptime_seconds: state.stats.uptime().as_secs(),
        api_requests: state.stats.api_requests(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
