//! Login endpoint.
//!
//! Root logs in against the argon2 hash in the server config and gets a
//! virtual token with the `auth:root` role and no session row behind it.
//! Staff accounts delegate to the auth module, which issues a refreshable
//! session pair.

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use axum::Json;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;

use fixerp_auth::model::{Claims, LoginRequest, ROOT_ROLE, TokenPair};
use fixerp_core::{ServiceError, new_id};

use crate::bootstrap::verify_root_password;
use crate::routes::ServerState;

/// Root tokens have no session, so there is nothing to refresh.
#[derive(Debug, Serialize)]
struct RootTokens {
    access_token: String,
    token_type: String,
    expires_in: i64,
}

pub fn routes(state: ServerState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .with_state(state)
}

/// POST /auth/login
async fn login(
    State(state): State<ServerState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    if body.username == "root" {
        return root_login(&state, &body.password);
    }

    let tokens: TokenPair = state.auth.login(&body.username, &body.password)?;
    serde_json::to_value(tokens)
        .map(Json)
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

fn root_login(state: &ServerState, password: &str) -> Result<Json<serde_json::Value>, ServiceError> {
    let config = &state.config;
    if !verify_root_password(password, &config.root.password_hash) {
        // Same message as a failed staff login.
        return Err(ServiceError::Unauthorized("invalid credentials".into()));
    }

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "root".to_string(),
        name: "root".to_string(),
        roles: vec![ROOT_ROLE.to_string()],
        sid: new_id(),
        iat: now,
        exp: now + config.jwt.expire_secs,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to encode JWT: {}", e);
        ServiceError::Internal("JWT encode failed".into())
    })?;

    let tokens = RootTokens {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: config.jwt.expire_secs,
    };
    serde_json::to_value(tokens)
        .map(Json)
        .map_err(|e| ServiceError::Internal(e.to_string()))
}
