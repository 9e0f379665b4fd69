use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::db::AppState;

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Require the configured staff bearer token.
///
/// With no `STAFF_API_KEY` configured every request is refused.
pub async fn staff_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.staff_api_key.as_deref() else {
        tracing::warn!("Staff request refused: STAFF_API_KEY is not configured");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let token = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let valid = token.len() == expected.len()
        && bool::from(token.as_bytes().ct_eq(expected.as_bytes()));
    if !valid {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
