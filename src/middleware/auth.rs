use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::ApiCredential;
use crate::state::AppState;

/// Resolves the model credential for an evaluation request and stores it in
/// the request extensions. Runs before the body is read, so a request without
/// a credential never reaches extraction or the model.
pub async fn credential_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    let credential = match credential_from_headers(request.headers()) {
        Some(credential) => {
            debug!("Using request credential for {} {}", method, path);
            credential
        }
        None => match &state.config.default_api_key {
            Some(key) => {
                debug!("Using configured default credential for {} {}", method, path);
                ApiCredential::new(key.clone())
            }
            None => {
                warn!("Missing model credential for {} {}", method, path);
                return Err(AppError::MissingCredential);
            }
        },
    };

    request.extensions_mut().insert(credential);
    Ok(next.run(request).await)
}

/// Reads `Authorization: Bearer <key>`, then `x-api-key`.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<ApiCredential> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty());

    let key = bearer.or_else(|| {
        headers
            .get("x-api-key")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty())
    })?;

    Some(ApiCredential::new(key))
}
