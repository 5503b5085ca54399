//! JWT authentication middleware.
//!
//! Extracts the bearer token, verifies it through the auth service (so a
//! revoked session is rejected immediately) and stores the `Claims` in the
//! request extensions for handlers to extract.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use fixerp_auth::service::AuthService;
use fixerp_core::ServiceError;

/// Middleware applied to every route. Public paths pass through.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".into()))?;

    let claims = auth.verify_token(token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Endpoints reachable without a token. Refresh is public because the
/// refresh token travels in the body, not the Authorization header.
fn is_public_path(path: &str) -> bool {
    matches!(
        path,
        "/" | "/health" | "/version" | "/auth/login" | "/auth/token/refresh"
    )
}
