use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use fixerp_core::{ListParams, ServiceError};

use crate::api::{AppState, require_admin};
use crate::model::{Claims, CreateUser, Role, SetPassword};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{id}/password", put(set_password))
        .route(
            "/users/{id}/sessions",
            get(list_sessions).delete(revoke_sessions),
        )
}

#[derive(Debug, Deserialize)]
struct UserFilter {
    role: Option<Role>,
}

async fn list_users(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let (items, total) = svc.list_users(&params, filter.role)?;
    Ok(Json(serde_json::json!({
        "items": items,
        "total": total,
    })))
}

async fn create_user(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<CreateUser>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    require_admin(&claims)?;
    let user = svc.create_user(input)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(user).unwrap()),
    ))
}

async fn get_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let user = svc.get_user(&id)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

async fn update_user(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let user = svc.update_user(&id, patch)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

async fn delete_user(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    require_admin(&claims)?;
    svc.delete_user(&id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// PUT /auth/users/{id}/password — admin resets a password.
async fn set_password(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(input): Json<SetPassword>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    svc.set_password(&id, &input.password)?;
    // A reset invalidates every open session for the user.
    svc.revoke_all_user_sessions(&id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

async fn list_sessions(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let sessions = svc.list_user_sessions(&id)?;
    Ok(Json(serde_json::json!({"items": sessions})))
}

async fn revoke_sessions(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let revoked = svc.revoke_all_user_sessions(&id)?;
    Ok(Json(serde_json::json!({"revoked": revoked})))
}
