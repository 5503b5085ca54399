use std::sync::Arc;

use chrono::{Duration, Utc};

use fixerp_catalog::service::CatalogService;
use fixerp_core::{ListParams, ListResult, ServiceError, merge_patch, new_id, now_rfc3339};
use fixerp_crm::service::CrmService;
use fixerp_inventory::model::StockLine;
use fixerp_inventory::service::InventoryService;
use fixerp_sql::SQLStore;

use crate::model::{
    CreateRepair, PartInput, Repair, RepairFilter, RepairPart, RepairStats, RepairStatus,
    StatusCount, WARRANTY_DAYS, Warranty,
};
use crate::store::RepairStore;

/// Fields a merge-patch may touch. Everything else on a ticket is either a
/// snapshot or moves through a lifecycle operation.
const PATCHABLE: &[&str] = &["fault", "fee", "note", "technicianId"];

/// Repair ticket service. Coordinates the ticket store with CRM and
/// catalog snapshots and with inventory consumption.
pub struct RepairService {
    store: RepairStore,
    inventory: Arc<InventoryService>,
    crm: Arc<CrmService>,
    catalog: Arc<CatalogService>,
}

impl RepairService {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        inventory: Arc<InventoryService>,
        crm: Arc<CrmService>,
        catalog: Arc<CatalogService>,
    ) -> Result<Arc<Self>, ServiceError> {
        let store = RepairStore::new(sql)?;
        Ok(Arc::new(Self {
            store,
            inventory,
            crm,
            catalog,
        }))
    }

    /// Open a ticket. Customer name/phone and the model name are
    /// snapshotted so later CRM or catalog edits don't rewrite history.
    pub fn create_repair(&self, input: CreateRepair) -> Result<Repair, ServiceError> {
        let fault = input.fault.trim().to_string();
        if fault.is_empty() {
            return Err(ServiceError::Validation("fault must not be empty".into()));
        }
        if input.fee < 0 {
            return Err(ServiceError::Validation("fee must not be negative".into()));
        }

        let customer = self.crm.get_customer(&input.customer_id)?;
        let phone_model_name = match &input.phone_model_id {
            Some(model_id) => self.catalog.get_phone_model(model_id)?.name,
            None => {
                let name = input
                    .phone_model_name
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                if name.is_empty() {
                    return Err(ServiceError::Validation(
                        "phoneModelId or phoneModelName is required".into(),
                    ));
                }
                name
            }
        };

        let now = now_rfc3339();
        let repair = Repair {
            id: new_id(),
            customer_id: customer.id,
            customer_name: customer.name,
            phone: customer.phone,
            phone_model_id: input.phone_model_id,
            phone_model_name,
            imei: input.imei,
            fault,
            fee: input.fee,
            status: RepairStatus::Pending,
            technician_id: input.technician_id,
            parts: vec![],
            rework_count: 0,
            note: input.note,
            created_at: now.clone(),
            updated_at: now,
            repaired_at: None,
            picked_up_at: None,
        };

        self.store.create(&repair)?;
        Ok(repair)
    }

    pub fn get_repair(&self, id: &str) -> Result<Repair, ServiceError> {
        self.store.get(id)
    }

    pub fn list_repairs(
        &self,
        params: &ListParams,
        filter: &RepairFilter,
    ) -> Result<ListResult<Repair>, ServiceError> {
        self.store.list(params, filter)
    }

    /// Ticket counts per status, in lifecycle order, zero-filled.
    pub fn stats(&self) -> Result<RepairStats, ServiceError> {
        let counts = self.store.stats()?;
        let by_status: Vec<StatusCount> = RepairStatus::all()
            .into_iter()
            .map(|status| StatusCount {
                status,
                label: status.label(),
                count: counts.get(status.as_str()).copied().unwrap_or(0),
            })
            .collect();
        let total = by_status.iter().map(|s| s.count).sum();
        Ok(RepairStats { total, by_status })
    }

    /// Merge-patch the editable fields of an open ticket.
    pub fn update_repair(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Repair, ServiceError> {
        let current = self.store.get(id)?;
        if current.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "repair is {}",
                current.status.as_str()
            )));
        }

        let mut clean = serde_json::Map::new();
        if let Some(obj) = patch.as_object() {
            for key in PATCHABLE {
                if let Some(value) = obj.get(*key) {
                    clean.insert((*key).to_string(), value.clone());
                }
            }
        }
        clean.insert("updatedAt".into(), serde_json::json!(now_rfc3339()));

        let mut base =
            serde_json::to_value(&current).map_err(|e| ServiceError::Internal(e.to_string()))?;
        merge_patch(&mut base, &serde_json::Value::Object(clean));

        let updated: Repair = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid patch: {e}")))?;
        if updated.fault.trim().is_empty() {
            return Err(ServiceError::Validation("fault must not be empty".into()));
        }
        if updated.fee < 0 {
            return Err(ServiceError::Validation("fee must not be negative".into()));
        }

        self.store.update_cas(&updated, current.status)?;
        Ok(updated)
    }

    /// PENDING → REPAIRING, optionally assigning the technician.
    pub fn start_repair(
        &self,
        id: &str,
        technician_id: Option<String>,
    ) -> Result<Repair, ServiceError> {
        let current = self.store.get(id)?;
        if !current.status.can_transition(RepairStatus::Repairing) {
            return Err(ServiceError::Conflict(format!(
                "cannot start a {} repair",
                current.status.as_str()
            )));
        }

        let mut updated = current.clone();
        updated.status = RepairStatus::Repairing;
        updated.technician_id = technician_id.or(current.technician_id.clone());
        updated.updated_at = now_rfc3339();

        self.store.update_cas(&updated, current.status)?;
        Ok(updated)
    }

    /// REPAIRING | REWORKING → REPAIRED, consuming the listed parts.
    ///
    /// Parts come out of inventory before the ticket write. If the ticket
    /// write then loses the status race, the consumption is compensated
    /// before the error returns. Rework parts go on the ticket at zero
    /// charge; the stock movements still carry the real price.
    pub fn complete_repair(
        &self,
        id: &str,
        parts: Vec<PartInput>,
    ) -> Result<Repair, ServiceError> {
        let current = self.store.get(id)?;
        if !current.status.can_transition(RepairStatus::Repaired) {
            return Err(ServiceError::Conflict(format!(
                "cannot complete a {} repair",
                current.status.as_str()
            )));
        }
        let is_rework = current.status == RepairStatus::Reworking;

        let mut lines = Vec::with_capacity(parts.len());
        for part in &parts {
            if part.qty <= 0 {
                return Err(ServiceError::Validation("part qty must be positive".into()));
            }
            let component = self.inventory.get_component(&part.component_id)?;
            lines.push(StockLine {
                component_id: component.id,
                name: component.name,
                qty: part.qty,
                unit_price: part.unit_price.unwrap_or(component.public_price),
            });
        }

        let now = now_rfc3339();
        let mut updated = current.clone();
        updated.status = RepairStatus::Repaired;
        updated.repaired_at = Some(now.clone());
        updated.updated_at = now;
        if is_rework {
            updated.rework_count += 1;
        }
        updated.parts.extend(lines.iter().map(|line| RepairPart {
            component_id: line.component_id.clone(),
            name: line.name.clone(),
            qty: line.qty,
            unit_price: if is_rework { 0 } else { line.unit_price },
        }));

        if !lines.is_empty() {
            self.inventory.consume_for_repair(id, &lines)?;
        }
        if let Err(err) = self.store.update_cas(&updated, current.status) {
            // Losing the ticket race after consuming puts the parts back.
            if !lines.is_empty() {
                let _ = self.inventory.restock_for_repair(id, &lines);
            }
            return Err(err);
        }
        Ok(updated)
    }

    /// REPAIRED → PICKED_UP. One transaction writes the status and opens
    /// the warranty.
    pub fn pickup_repair(&self, id: &str) -> Result<Repair, ServiceError> {
        let current = self.store.get(id)?;
        if !current.status.can_transition(RepairStatus::PickedUp) {
            return Err(ServiceError::Conflict(format!(
                "cannot pick up a {} repair",
                current.status.as_str()
            )));
        }

        let now = now_rfc3339();
        let mut updated = current.clone();
        updated.status = RepairStatus::PickedUp;
        updated.picked_up_at = Some(now.clone());
        updated.updated_at = now.clone();

        let warranty = Warranty {
            id: new_id(),
            repair_id: updated.id.clone(),
            customer_id: updated.customer_id.clone(),
            started_at: now.clone(),
            expires_at: (Utc::now() + Duration::days(WARRANTY_DAYS)).to_rfc3339(),
            created_at: now,
        };

        self.store.pickup_with_warranty(&updated, &warranty)?;
        Ok(updated)
    }

    /// PICKED_UP → REWORKING, only while the warranty is active.
    pub fn rework_repair(&self, id: &str) -> Result<Repair, ServiceError> {
        let current = self.store.get(id)?;
        if !current.status.can_transition(RepairStatus::Reworking) {
            return Err(ServiceError::Conflict(format!(
                "cannot rework a {} repair",
                current.status.as_str()
            )));
        }

        let warranty = self
            .store
            .warranty_for_repair(id)
            .map_err(|_| ServiceError::Validation("no warranty on file".into()))?;
        if !warranty.active() {
            return Err(ServiceError::Validation(format!(
                "warranty expired on {}",
                warranty.expires_at
            )));
        }

        let mut updated = current.clone();
        updated.status = RepairStatus::Reworking;
        updated.updated_at = now_rfc3339();

        self.store.update_cas(&updated, current.status)?;
        Ok(updated)
    }

    /// PENDING | REPAIRING → CANCELLED.
    pub fn cancel_repair(&self, id: &str) -> Result<Repair, ServiceError> {
        let current = self.store.get(id)?;
        if !current.status.can_transition(RepairStatus::Cancelled) {
            return Err(ServiceError::Conflict(format!(
                "cannot cancel a {} repair",
                current.status.as_str()
            )));
        }

        let mut updated = current.clone();
        updated.status = RepairStatus::Cancelled;
        updated.updated_at = now_rfc3339();

        self.store.update_cas(&updated, current.status)?;
        Ok(updated)
    }

    pub fn get_warranty(&self, id: &str) -> Result<Warranty, ServiceError> {
        self.store.get_warranty(id)
    }

    pub fn warranty_for_repair(&self, repair_id: &str) -> Result<Warranty, ServiceError> {
        self.store.warranty_for_repair(repair_id)
    }

    pub fn list_warranties(
        &self,
        params: &ListParams,
        customer_id: Option<&str>,
    ) -> Result<ListResult<Warranty>, ServiceError> {
        self.store.list_warranties(params, customer_id)
    }
}
