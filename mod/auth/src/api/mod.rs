mod me;
mod sessions;
mod token;
mod users;

use std::sync::Arc;

use axum::Router;

use fixerp_core::ServiceError;

use crate::model::Claims;
use crate::service::AuthService;

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Build the auth API router.
///
/// Routes are relative; the server nests them under `/auth` and layers the
/// JWT middleware on top of all module routes.
pub fn build_router(svc: Arc<AuthService>) -> Router {
    Router::new()
        .merge(users::routes())
        .merge(sessions::routes())
        .merge(me::routes())
        .merge(token::routes())
        .with_state(svc)
}

/// Reject callers without the admin (or root) role.
pub(crate) fn require_admin(claims: &Claims) -> Result<(), ServiceError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied("admin role required".into()))
    }
}
