use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use typewrite_types::api::Claims;

use crate::auth::{AppState, decode_token};
use crate::error::ApiError;

/// Extract and validate the bearer JWT from the Authorization header.
/// Validation uses the configured signing secret so tokens survive whatever
/// source (env or JSON override file) the secret came from.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = decode_token(&state.config.jwt_secret, token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Role allow-list check for routes that need more than a valid token.
pub fn authorize_role(claims: &Claims, allowed: &[String]) -> Result<(), ApiError> {
    if allowed.iter().any(|role| role == &claims.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
