use crate::AppState;
use axum::{extract::State, http::StatusCode};

/// Liveness probe that also checks the store answers.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service and store are reachable", body = String),
        (status = 503, description = "Store is unreachable", body = String),
    )
)]
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable")
        }
    }
}
