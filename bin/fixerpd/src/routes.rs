//! Route registration: system endpoints, login, and the module routers.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;

use fixerp_auth::service::AuthService;

use crate::auth_middleware;
use crate::config::ServerConfig;
use crate::login;

/// State shared by the login handler and the JWT middleware.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub config: Arc<ServerConfig>,
}

/// Build the complete router.
///
/// Module routes arrive as `Router<()>` (each module applied its own state)
/// and are nested under `/{module_name}`. The JWT middleware wraps
/// everything; public paths are allowlisted inside it.
pub fn build_router(state: ServerState, module_routes: Vec<(&str, Router)>) -> Router {
    let auth = state.auth.clone();

    let mut app = Router::new()
        .route("/", get(version))
        .route("/health", get(health))
        .route("/version", get(version))
        .merge(login::routes(state));

    for (name, router) in module_routes {
        app = app.nest(&format!("/{name}"), router);
    }

    app.layer(middleware::from_fn_with_state(
        auth,
        auth_middleware::auth_middleware,
    ))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "fixerpd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
