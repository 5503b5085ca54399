//! Catalog module — reference data the rest of the shop points into.
//!
//! # Resources
//!
//! - **Brand** — phone brand, unique name
//! - **PhoneModel** — model under a brand, unique per brand
//! - **Supplier** — parts supplier
//! - **ShopSettings** — singleton shop profile

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use fixerp_core::Module;

use crate::service::CatalogService;

/// Catalog module implementing the Module trait.
pub struct CatalogModule {
    service: Arc<CatalogService>,
}

impl CatalogModule {
    pub fn new(sql: Arc<dyn fixerp_sql::SQLStore>) -> Result<Self, fixerp_core::ServiceError> {
        let service = CatalogService::new(sql)?;
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<CatalogService> {
        &self.service
    }
}

impl Module for CatalogModule {
    fn name(&self) -> &str {
        "catalog"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
