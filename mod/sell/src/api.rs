use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

use fixerp_auth::model::Claims;
use fixerp_core::{ListParams, ListResult, ServiceError};

use crate::model::{
    CheckoutInput, CreateSellItem, DailySummary, ItemFilter, PosLine, PosLineInput, Sale,
    SaleFilter, SellItem,
};
use crate::service::SellService;

/// Shared application state.
pub type AppState = Arc<SellService>;

/// Build the sell API router. Routes are relative; the server nests them
/// under `/sell`.
pub fn build_router(svc: Arc<SellService>) -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/@by-barcode/{code}", get(get_item_by_barcode))
        .route(
            "/items/{id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/items/{id}/@restock", post(restock_item))
        .route("/pos/{cart_id}/lines", get(pos_lines).put(put_pos_line))
        .route("/pos/{cart_id}/lines/{item_id}", delete(remove_pos_line))
        .route("/pos/{cart_id}", delete(clear_pos))
        .route("/pos/{cart_id}/@checkout", post(checkout))
        .route("/sales", get(list_sales))
        .route("/sales/@summary", get(daily_summary))
        .route("/sales/{id}", get(get_sale))
        .route("/sales/{id}/@void", post(void_sale))
        .with_state(svc)
}

async fn create_item(
    State(svc): State<AppState>,
    Json(body): Json<CreateSellItem>,
) -> Result<(axum::http::StatusCode, Json<SellItem>), ServiceError> {
    let item = svc.create_item(body)?;
    Ok((axum::http::StatusCode::CREATED, Json(item)))
}

async fn list_items(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ItemFilter>,
) -> Result<Json<ListResult<SellItem>>, ServiceError> {
    Ok(Json(svc.list_items(&params, &filter)?))
}

async fn get_item(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SellItem>, ServiceError> {
    Ok(Json(svc.get_item(&id)?))
}

/// GET /sell/items/@by-barcode/{code} — scanner lookup at the counter.
async fn get_item_by_barcode(
    State(svc): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SellItem>, ServiceError> {
    Ok(Json(svc.get_item_by_barcode(&code)?))
}

async fn update_item(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<SellItem>, ServiceError> {
    Ok(Json(svc.update_item(&id, patch)?))
}

async fn delete_item(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_item(&id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RestockBody {
    qty: i64,
}

/// POST /sell/items/{id}/@restock — book a delivery onto the shelf.
async fn restock_item(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RestockBody>,
) -> Result<Json<SellItem>, ServiceError> {
    Ok(Json(svc.restock_item(&id, body.qty)?))
}

async fn pos_lines(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let items = svc.pos_lines(&cart_id)?;
    Ok(Json(serde_json::json!({"items": items})))
}

async fn put_pos_line(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
    Json(body): Json<PosLineInput>,
) -> Result<Json<PosLine>, ServiceError> {
    Ok(Json(svc.put_pos_line(&cart_id, body)?))
}

async fn remove_pos_line(
    State(svc): State<AppState>,
    Path((cart_id, item_id)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.remove_pos_line(&cart_id, &item_id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn clear_pos(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let removed = svc.clear_pos(&cart_id)?;
    Ok(Json(serde_json::json!({"removed": removed})))
}

/// POST /sell/pos/{cartId}/@checkout — the signed-in user is the cashier.
async fn checkout(
    State(svc): State<AppState>,
    Path(cart_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<CheckoutInput>,
) -> Result<(axum::http::StatusCode, Json<Sale>), ServiceError> {
    let sale = svc.checkout(&cart_id, &claims.sub, body)?;
    Ok((axum::http::StatusCode::CREATED, Json(sale)))
}

async fn list_sales(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<SaleFilter>,
) -> Result<Json<ListResult<Sale>>, ServiceError> {
    Ok(Json(svc.list_sales(&params, &filter)?))
}

#[derive(Debug, Default, Deserialize)]
struct SummaryQuery {
    #[serde(default)]
    date: Option<String>,
}

/// GET /sell/sales/@summary?date=YYYY-MM-DD — defaults to today.
async fn daily_summary(
    State(svc): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<DailySummary>, ServiceError> {
    Ok(Json(svc.summary(query.date)?))
}

async fn get_sale(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ServiceError> {
    Ok(Json(svc.get_sale(&id)?))
}

/// POST /sell/sales/{id}/@void — cancel a sale and restock its lines.
async fn void_sale(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ServiceError> {
    Ok(Json(svc.void_sale(&id)?))
}
