use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use fixerp_core::ServiceError;

use crate::api::AppState;
use crate::model::ShopSettings;

pub fn routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).patch(update_settings))
}

async fn get_settings(State(svc): State<AppState>) -> Result<Json<ShopSettings>, ServiceError> {
    Ok(Json(svc.get_settings()?))
}

async fn update_settings(
    State(svc): State<AppState>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<ShopSettings>, ServiceError> {
    Ok(Json(svc.update_settings(patch)?))
}
