use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use fixerp_core::{ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::Brand;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/brands", get(list_brands).post(create_brand))
        .route(
            "/brands/{id}",
            get(get_brand).patch(update_brand).delete(delete_brand),
        )
}

#[derive(Debug, Deserialize)]
struct CreateBrandBody {
    name: String,
}

async fn create_brand(
    State(svc): State<AppState>,
    Json(body): Json<CreateBrandBody>,
) -> Result<(axum::http::StatusCode, Json<Brand>), ServiceError> {
    let brand = svc.create_brand(body.name)?;
    Ok((axum::http::StatusCode::CREATED, Json(brand)))
}

async fn list_brands(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Brand>>, ServiceError> {
    Ok(Json(svc.list_brands(&params)?))
}

async fn get_brand(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Brand>, ServiceError> {
    Ok(Json(svc.get_brand(&id)?))
}

async fn update_brand(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Brand>, ServiceError> {
    Ok(Json(svc.update_brand(&id, patch)?))
}

async fn delete_brand(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_brand(&id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
