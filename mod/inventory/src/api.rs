use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

use fixerp_core::{ListParams, ListResult, ServiceError};

use crate::model::{
    CommitResult, Component, ComponentFilter, CreateComponent, LineInput, MovementFilter,
    StockLine, StockMovement,
};
use crate::service::{CartKind, InventoryService};

/// Shared application state.
pub type AppState = Arc<InventoryService>;

/// Build the inventory API router. Routes are relative; the server nests
/// them under `/inventory`.
pub fn build_router(svc: Arc<InventoryService>) -> Router {
    Router::new()
        .route("/components", get(list_components).post(create_component))
        .route("/components/@search", get(search_components))
        .route("/components/@low-stock", get(low_stock))
        .route(
            "/components/{id}",
            get(get_component)
                .patch(update_component)
                .delete(delete_component),
        )
        .route(
            "/stockin/{cart_id}/lines",
            get(stockin_lines).put(put_stockin_line),
        )
        .route(
            "/stockin/{cart_id}/lines/{component_id}",
            delete(remove_stockin_line),
        )
        .route("/stockin/{cart_id}", delete(clear_stockin))
        .route("/stockin/{cart_id}/@commit", post(commit_stockin))
        .route(
            "/stockout/{cart_id}/lines",
            get(stockout_lines).put(put_stockout_line),
        )
        .route(
            "/stockout/{cart_id}/lines/{component_id}",
            delete(remove_stockout_line),
        )
        .route("/stockout/{cart_id}", delete(clear_stockout))
        .route("/stockout/{cart_id}/@commit", post(commit_stockout))
        .route("/movements", get(list_movements))
        .with_state(svc)
}

async fn create_component(
    State(svc): State<AppState>,
    Json(body): Json<CreateComponent>,
) -> Result<(axum::http::StatusCode, Json<Component>), ServiceError> {
    let component = svc.create_component(body)?;
    Ok((axum::http::StatusCode::CREATED, Json(component)))
}

async fn list_components(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ComponentFilter>,
) -> Result<Json<ListResult<Component>>, ServiceError> {
    Ok(Json(svc.list_components(&params, &filter)?))
}

/// GET /inventory/components/@search?q= — full-text search by name/note.
async fn search_components(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let query = params.q.unwrap_or_default();
    let items = svc.search_components(&query, params.limit)?;
    Ok(Json(serde_json::json!({"items": items})))
}

/// GET /inventory/components/@low-stock — parts at or below threshold.
async fn low_stock(State(svc): State<AppState>) -> Result<Json<serde_json::Value>, ServiceError> {
    let items = svc.low_stock()?;
    Ok(Json(serde_json::json!({"items": items})))
}

async fn get_component(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Component>, ServiceError> {
    Ok(Json(svc.get_component(&id)?))
}

async fn update_component(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Component>, ServiceError> {
    Ok(Json(svc.update_component(&id, patch)?))
}

async fn delete_component(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_component(&id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitStockIn {
    #[serde(default)]
    supplier_id: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitStockOut {
    #[serde(default)]
    reason: Option<String>,
}

async fn stockin_lines(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let items = svc.lines(CartKind::StockIn, &cart_id)?;
    Ok(Json(serde_json::json!({"items": items})))
}

async fn put_stockin_line(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
    Json(body): Json<LineInput>,
) -> Result<Json<StockLine>, ServiceError> {
    Ok(Json(svc.put_line(CartKind::StockIn, &cart_id, body)?))
}

async fn remove_stockin_line(
    State(svc): State<AppState>,
    Path((cart_id, component_id)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.remove_line(CartKind::StockIn, &cart_id, &component_id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn clear_stockin(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let removed = svc.clear_cart(CartKind::StockIn, &cart_id)?;
    Ok(Json(serde_json::json!({"removed": removed})))
}

/// POST /inventory/stockin/{cartId}/@commit — one transaction for the
/// whole cart.
async fn commit_stockin(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
    body: Option<Json<CommitStockIn>>,
) -> Result<Json<CommitResult>, ServiceError> {
    let Json(body) = body.unwrap_or_default();
    Ok(Json(svc.commit_stockin(
        &cart_id,
        body.supplier_id.as_deref(),
        body.note.as_deref(),
    )?))
}

async fn stockout_lines(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let items = svc.lines(CartKind::StockOut, &cart_id)?;
    Ok(Json(serde_json::json!({"items": items})))
}

async fn put_stockout_line(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
    Json(body): Json<LineInput>,
) -> Result<Json<StockLine>, ServiceError> {
    Ok(Json(svc.put_line(CartKind::StockOut, &cart_id, body)?))
}

async fn remove_stockout_line(
    State(svc): State<AppState>,
    Path((cart_id, component_id)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.remove_line(CartKind::StockOut, &cart_id, &component_id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn clear_stockout(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let removed = svc.clear_cart(CartKind::StockOut, &cart_id)?;
    Ok(Json(serde_json::json!({"removed": removed})))
}

async fn commit_stockout(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
    body: Option<Json<CommitStockOut>>,
) -> Result<Json<CommitResult>, ServiceError> {
    let Json(body) = body.unwrap_or_default();
    Ok(Json(svc.commit_stockout(&cart_id, body.reason.as_deref())?))
}

/// GET /inventory/movements — the stock ledger, newest first.
async fn list_movements(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<MovementFilter>,
) -> Result<Json<ListResult<StockMovement>>, ServiceError> {
    Ok(Json(svc.movements(&params, &filter)?))
}
