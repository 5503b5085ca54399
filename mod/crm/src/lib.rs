//! CRM module — customer records with full-text lookup.

pub mod api;
pub mod model;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;

use fixerp_core::Module;

use crate::service::CrmService;

/// CRM module implementing the Module trait.
pub struct CrmModule {
    service: Arc<CrmService>,
}

impl CrmModule {
    pub fn new(
        sql: Arc<dyn fixerp_sql::SQLStore>,
        search: Arc<dyn fixerp_search::SearchEngine>,
    ) -> Result<Self, fixerp_core::ServiceError> {
        let service = CrmService::new(sql, search)?;
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<CrmService> {
        &self.service
    }
}

impl Module for CrmModule {
    fn name(&self) -> &str {
        "crm"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
