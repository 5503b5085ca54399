use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use fixerp_core::{ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::PhoneModel;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/models", get(list_models).post(create_model))
        .route(
            "/models/{id}",
            get(get_model).patch(update_model).delete(delete_model),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateModelBody {
    brand_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelFilter {
    brand_id: Option<String>,
}

async fn create_model(
    State(svc): State<AppState>,
    Json(body): Json<CreateModelBody>,
) -> Result<(axum::http::StatusCode, Json<PhoneModel>), ServiceError> {
    let model = svc.create_phone_model(body.brand_id, body.name)?;
    Ok((axum::http::StatusCode::CREATED, Json(model)))
}

async fn list_models(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ModelFilter>,
) -> Result<Json<ListResult<PhoneModel>>, ServiceError> {
    Ok(Json(
        svc.list_phone_models(&params, filter.brand_id.as_deref())?,
    ))
}

async fn get_model(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PhoneModel>, ServiceError> {
    Ok(Json(svc.get_phone_model(&id)?))
}

async fn update_model(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<PhoneModel>, ServiceError> {
    Ok(Json(svc.update_phone_model(&id, patch)?))
}

async fn delete_model(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_phone_model(&id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
