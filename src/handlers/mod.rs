pub mod criteria;
pub mod evaluate;
pub mod health;

pub use criteria::*;
pub use evaluate::*;
pub use health::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{credential_middleware, logging_middleware, rate_limit_middleware};
use crate::state::AppState;

/// Room for the text fields that travel with the upload.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size_bytes() + FORM_OVERHEAD_BYTES;

    // Credential check wraps the limiter so unauthenticated requests never take a slot.
    let evaluate = Router::new()
        .route("/api/v1/evaluate", post(evaluate_handler))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), credential_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/api/v1/criteria", get(criteria_handler))
        .merge(evaluate)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
