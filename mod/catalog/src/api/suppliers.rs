use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use fixerp_core::{ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::Supplier;
use crate::service::supplier::CreateSupplier;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/{id}",
            get(get_supplier)
                .patch(update_supplier)
                .delete(delete_supplier),
        )
}

async fn create_supplier(
    State(svc): State<AppState>,
    Json(body): Json<CreateSupplier>,
) -> Result<(axum::http::StatusCode, Json<Supplier>), ServiceError> {
    let supplier = svc.create_supplier(body)?;
    Ok((axum::http::StatusCode::CREATED, Json(supplier)))
}

async fn list_suppliers(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Supplier>>, ServiceError> {
    Ok(Json(svc.list_suppliers(&params)?))
}

async fn get_supplier(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Supplier>, ServiceError> {
    Ok(Json(svc.get_supplier(&id)?))
}

async fn update_supplier(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Supplier>, ServiceError> {
    Ok(Json(svc.update_supplier(&id, patch)?))
}

async fn delete_supplier(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_supplier(&id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
