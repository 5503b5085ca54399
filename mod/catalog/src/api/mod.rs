mod brands;
mod models;
mod settings;
mod suppliers;

use std::sync::Arc;

use axum::Router;

use crate::service::CatalogService;

/// Shared application state.
pub type AppState = Arc<CatalogService>;

/// Build the catalog API router. Routes are relative; the server nests
/// them under `/catalog`.
pub fn build_router(svc: Arc<CatalogService>) -> Router {
    Router::new()
        .merge(brands::routes())
        .merge(models::routes())
        .merge(suppliers::routes())
        .merge(settings::routes())
        .with_state(svc)
}
