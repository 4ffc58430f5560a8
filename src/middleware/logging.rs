use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Id of the request being served on this task, if any. Error responses
/// report it so the body matches the `x-request-id` header and the logs.
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

fn incoming_request_id(request: &Request) -> Option<HeaderValue> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|value| !value.is_empty() && value.len() <= 128 && value.to_str().is_ok())
        .cloned()
}

/// Tags every request with an id, reusing the caller's `x-request-id` when
/// present, and echoes it on the response. Everything the request logs runs
/// inside a span carrying the id.
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = incoming_request_id(&request).unwrap_or_else(|| {
        // A hyphenated UUID is always a valid header value.
        HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap_or(HeaderValue::from_static("unknown"))
    });
    request.headers_mut().insert(REQUEST_ID_HEADER, request_id.clone());

    let id = request_id.to_str().unwrap_or("<non-ascii>").to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %request.method(),
        path = request.uri().path(),
    );

    let handled = async move {
        tracing::debug!(version = ?request.version(), "Request started");

        let mut response = next.run(request).await;
        response.headers_mut().insert(REQUEST_ID_HEADER, request_id);

        let status = response.status();
        let duration_ms = start.elapsed().as_millis() as u64;
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), duration_ms, "Request failed");
        } else {
            tracing::info!(status = status.as_u16(), duration_ms, "Request completed");
        }

        response
    };

    REQUEST_ID.scope(id, handled.instrument(span)).await
}
