use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use fixerp_core::{ListParams, ListResult, ServiceError};

use crate::model::{CreateRepair, PartInput, Repair, RepairFilter, RepairStats, Warranty};
use crate::service::RepairService;

/// Shared application state.
pub type AppState = Arc<RepairService>;

/// Build the repair API router. Routes are relative; the server nests them
/// under `/repair`.
pub fn build_router(svc: Arc<RepairService>) -> Router {
    Router::new()
        .route("/repairs", get(list_repairs).post(create_repair))
        .route("/repairs/@stats", get(stats))
        .route("/repairs/{id}", get(get_repair).patch(update_repair))
        .route("/repairs/{id}/@start", post(start_repair))
        .route("/repairs/{id}/@complete", post(complete_repair))
        .route("/repairs/{id}/@pickup", post(pickup_repair))
        .route("/repairs/{id}/@rework", post(rework_repair))
        .route("/repairs/{id}/@cancel", post(cancel_repair))
        .route("/repairs/{id}/warranty", get(repair_warranty))
        .route("/warranties", get(list_warranties))
        .route("/warranties/{id}", get(get_warranty))
        .with_state(svc)
}

async fn create_repair(
    State(svc): State<AppState>,
    Json(body): Json<CreateRepair>,
) -> Result<(axum::http::StatusCode, Json<Repair>), ServiceError> {
    let repair = svc.create_repair(body)?;
    Ok((axum::http::StatusCode::CREATED, Json(repair)))
}

async fn list_repairs(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<RepairFilter>,
) -> Result<Json<ListResult<Repair>>, ServiceError> {
    Ok(Json(svc.list_repairs(&params, &filter)?))
}

/// GET /repair/repairs/@stats — ticket counts per status.
async fn stats(State(svc): State<AppState>) -> Result<Json<RepairStats>, ServiceError> {
    Ok(Json(svc.stats()?))
}

async fn get_repair(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Repair>, ServiceError> {
    Ok(Json(svc.get_repair(&id)?))
}

async fn update_repair(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Repair>, ServiceError> {
    Ok(Json(svc.update_repair(&id, patch)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartBody {
    #[serde(default)]
    technician_id: Option<String>,
}

async fn start_repair(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<StartBody>>,
) -> Result<Json<Repair>, ServiceError> {
    let Json(body) = body.unwrap_or_default();
    Ok(Json(svc.start_repair(&id, body.technician_id)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteBody {
    #[serde(default)]
    parts: Vec<PartInput>,
}

async fn complete_repair(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<CompleteBody>>,
) -> Result<Json<Repair>, ServiceError> {
    let Json(body) = body.unwrap_or_default();
    Ok(Json(svc.complete_repair(&id, body.parts)?))
}

async fn pickup_repair(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Repair>, ServiceError> {
    Ok(Json(svc.pickup_repair(&id)?))
}

async fn rework_repair(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Repair>, ServiceError> {
    Ok(Json(svc.rework_repair(&id)?))
}

async fn cancel_repair(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Repair>, ServiceError> {
    Ok(Json(svc.cancel_repair(&id)?))
}

/// GET /repair/repairs/{id}/warranty — the warranty opened at pickup.
async fn repair_warranty(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Warranty>, ServiceError> {
    Ok(Json(svc.warranty_for_repair(&id)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WarrantyFilter {
    #[serde(default)]
    customer_id: Option<String>,
}

async fn list_warranties(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<WarrantyFilter>,
) -> Result<Json<ListResult<Warranty>>, ServiceError> {
    Ok(Json(
        svc.list_warranties(&params, filter.customer_id.as_deref())?,
    ))
}

async fn get_warranty(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Warranty>, ServiceError> {
    Ok(Json(svc.get_warranty(&id)?))
}
