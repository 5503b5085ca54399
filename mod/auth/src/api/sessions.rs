use axum::extract::{Extension, Path, State};
use axum::routing::delete;
use axum::{Json, Router};

use fixerp_core::ServiceError;

use crate::api::AppState;
use crate::model::Claims;

pub fn routes() -> Router<AppState> {
    Router::new().route("/sessions/{id}", delete(revoke_session))
}

/// DELETE /auth/sessions/{id} — revoke one session.
///
/// Admins can revoke any session; everyone else only their own.
async fn revoke_session(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let session = svc.get_session(&id)?;
    if !claims.is_admin() && session.user_id != claims.sub {
        return Err(ServiceError::PermissionDenied(
            "cannot revoke another user's session".into(),
        ));
    }
    svc.revoke_session(&id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
