use crate::services::render_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "solver-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once the scratch directory is usable.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    if state.scratch.exists() {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::ServiceUnavailable(format!(
            "scratch directory {} is missing",
            state.scratch.root().display()
        )))
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        render_metrics(),
    )
}
