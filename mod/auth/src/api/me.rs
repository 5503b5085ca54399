use axum::extract::{Extension, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use fixerp_core::ServiceError;

use crate::api::AppState;
use crate::model::{ChangePassword, Claims, ROOT_ROLE};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me/password", post(change_password))
        .route("/me/sessions", get(my_sessions))
}

/// GET /auth/me — the logged-in user's record.
///
/// The root account has no user row; its profile is synthesized from the
/// claims.
async fn me(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    if claims.roles.iter().any(|r| r == ROOT_ROLE) {
        return Ok(Json(serde_json::json!({
            "id": claims.sub,
            "username": "root",
            "name": claims.name,
            "role": "root",
            "active": true,
        })));
    }
    let user = svc.get_user(&claims.sub)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

/// POST /auth/me/password — change one's own password.
async fn change_password(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<ChangePassword>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    if claims.roles.iter().any(|r| r == ROOT_ROLE) {
        return Err(ServiceError::Validation(
            "the root password lives in the server config".into(),
        ));
    }
    svc.change_password(&claims.sub, &input.old_password, &input.new_password)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

/// GET /auth/me/sessions — the logged-in user's active sessions.
async fn my_sessions(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let sessions = svc.list_user_sessions(&claims.sub)?;
    Ok(Json(serde_json::json!({"items": sessions})))
}
