use axum::extract::{Extension, State};
use axum::routing::post;
use axum::{Json, Router};

use fixerp_core::ServiceError;

use crate::api::AppState;
use crate::model::{Claims, RefreshRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/token/refresh", post(refresh))
        .route("/logout", post(logout))
}

/// POST /auth/token/refresh — exchange a refresh token for a new pair.
///
/// Public at the server level; the refresh token travels in the body, not
/// the Authorization header.
async fn refresh(
    State(svc): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let tokens = svc.refresh_tokens(&input.refresh_token)?;
    Ok(Json(serde_json::to_value(tokens).unwrap()))
}

/// POST /auth/logout — revoke the current session.
///
/// Root tokens have no session row; logging out is a no-op for them.
async fn logout(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    match svc.revoke_session(&claims.sid) {
        Ok(()) | Err(ServiceError::NotFound(_)) => Ok(Json(serde_json::json!({"ok": true}))),
        Err(e) => Err(e),
    }
}
