use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use fixerp_core::{ListParams, ListResult, ServiceError};

use crate::model::{CreateCustomer, Customer};
use crate::service::CrmService;

/// Shared application state.
pub type AppState = Arc<CrmService>;

/// Build the CRM API router. Routes are relative; the server nests them
/// under `/crm`.
pub fn build_router(svc: Arc<CrmService>) -> Router {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/@search", get(search_customers))
        .route("/customers/@by-phone/{phone}", get(get_by_phone))
        .route(
            "/customers/{id}",
            get(get_customer)
                .patch(update_customer)
                .delete(delete_customer),
        )
        .with_state(svc)
}

async fn create_customer(
    State(svc): State<AppState>,
    Json(body): Json<CreateCustomer>,
) -> Result<(axum::http::StatusCode, Json<Customer>), ServiceError> {
    let customer = svc.create_customer(body)?;
    Ok((axum::http::StatusCode::CREATED, Json(customer)))
}

async fn list_customers(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Customer>>, ServiceError> {
    Ok(Json(svc.list_customers(&params)?))
}

/// GET /crm/customers/@search?q= — full-text search by name/phone/wechat.
async fn search_customers(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let query = params.q.unwrap_or_default();
    let items = svc.search_customers(&query, params.limit)?;
    Ok(Json(serde_json::json!({"items": items})))
}

/// GET /crm/customers/@by-phone/{phone} — exact lookup for intake and POS.
async fn get_by_phone(
    State(svc): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.get_by_phone(&phone)?))
}

async fn get_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.get_customer(&id)?))
}

async fn update_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.update_customer(&id, patch)?))
}

async fn delete_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_customer(&id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
