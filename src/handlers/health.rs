use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::state::AppState;

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    info!("Health check requested");

    let metrics = state.limiter.metrics();
    let status = if metrics.available_permits > 0 {
        "healthy"
    } else {
        "degraded"
    };

    let response = json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "model": state.llm.model(),
            "default_credential": state.config.default_api_key.is_some()
        },
        "rate_limiting": {
            "total_requests": metrics.total_requests,
            "rejected_requests": metrics.rejected_requests,
            "available_permits": metrics.available_permits,
            "rejection_rate": if metrics.total_requests > 0 {
                (metrics.rejected_requests as f64 / metrics.total_requests as f64 * 100.0).round() / 100.0
            } else {
                0.0
            }
        }
    });

    info!(
        status = status,
        available_permits = metrics.available_permits,
        "Health check completed"
    );

    Json(response)
}

/// Readiness check endpoint. Not ready while every evaluation slot is taken.
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if state.limiter.metrics().available_permits > 0 {
        info!("Readiness check passed");
        StatusCode::OK
    } else {
        info!("Readiness check failed - no free evaluation slots");
        StatusCode::SERVICE_UNAVAILABLE
    }
}
