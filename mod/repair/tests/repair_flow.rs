//! End-to-end ticket lifecycle against the real CRM, catalog and
//! inventory services sharing one database.

use std::sync::Arc;

use tempfile::TempDir;

use fixerp_catalog::service::CatalogService;
use fixerp_core::{ListParams, ServiceError};
use fixerp_crm::model::{CreateCustomer, Customer};
use fixerp_crm::service::CrmService;
use fixerp_inventory::model::{
    Component, CreateComponent, LineInput, MovementFilter, MovementKind, Quality,
};
use fixerp_inventory::service::{CartKind, InventoryService};
use fixerp_kv::RedbStore;
use fixerp_repair::model::{CreateRepair, PartInput, RepairStatus};
use fixerp_repair::service::RepairService;
use fixerp_search::TantivyEngine;
use fixerp_sql::SqliteStore;

struct Shop {
    repair: Arc<RepairService>,
    inventory: Arc<InventoryService>,
    crm: Arc<CrmService>,
    catalog: Arc<CatalogService>,
    _dir: TempDir,
}

fn shop() -> Shop {
    let dir = tempfile::tempdir().unwrap();
    let sql: Arc<dyn fixerp_sql::SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let kv: Arc<dyn fixerp_kv::KVStore> =
        Arc::new(RedbStore::open(&dir.path().join("carts.redb")).unwrap());
    let search: Arc<dyn fixerp_search::SearchEngine> =
        Arc::new(TantivyEngine::open(&dir.path().join("index")).unwrap());

    let catalog = CatalogService::new(sql.clone()).unwrap();
    let crm = CrmService::new(sql.clone(), search.clone()).unwrap();
    let inventory = InventoryService::new(sql.clone(), kv, search).unwrap();
    let repair = RepairService::new(sql, inventory.clone(), crm.clone(), catalog.clone()).unwrap();

    Shop {
        repair,
        inventory,
        crm,
        catalog,
        _dir: dir,
    }
}

fn walk_in_customer(shop: &Shop) -> Customer {
    shop.crm
        .create_customer(CreateCustomer {
            name: "张伟".into(),
            phone: "13800000001".into(),
            wechat: None,
            address: None,
            note: None,
        })
        .unwrap()
}

/// Create a component and put `qty` units on the shelf through a stock-in.
fn stocked_component(shop: &Shop, name: &str, qty: i64) -> Component {
    let component = shop
        .inventory
        .create_component(CreateComponent {
            name: name.into(),
            quality: Quality::Original,
            purchase_price: 10000,
            public_price: 16000,
            low_stock_threshold: 1,
            supplier_id: None,
            phone_model_ids: vec![],
            note: None,
        })
        .unwrap();

    if qty > 0 {
        shop.inventory
            .put_line(
                CartKind::StockIn,
                "seed",
                LineInput {
                    component_id: component.id.clone(),
                    qty,
                    unit_price: None,
                },
            )
            .unwrap();
        shop.inventory.commit_stockin("seed", None, None).unwrap();
    }
    shop.inventory.get_component(&component.id).unwrap()
}

fn ticket(shop: &Shop, customer: &Customer, fault: &str) -> fixerp_repair::model::Repair {
    shop.repair
        .create_repair(CreateRepair {
            customer_id: customer.id.clone(),
            phone_model_id: None,
            phone_model_name: Some("iPhone 12".into()),
            imei: Some("356938035643809".into()),
            fault: fault.into(),
            fee: 5000,
            technician_id: None,
            note: None,
        })
        .unwrap()
}

#[test]
fn full_lifecycle_with_warranty_rework() {
    let shop = shop();
    let customer = walk_in_customer(&shop);
    let screen = stocked_component(&shop, "iPhone 12 屏幕", 3);

    let repair = ticket(&shop, &customer, "碎屏");
    assert_eq!(repair.status, RepairStatus::Pending);
    assert_eq!(repair.customer_name, "张伟");
    assert_eq!(repair.phone, "13800000001");
    assert_eq!(repair.total(), 5000);

    let repair = shop
        .repair
        .start_repair(&repair.id, Some("tech1".into()))
        .unwrap();
    assert_eq!(repair.status, RepairStatus::Repairing);
    assert_eq!(repair.technician_id.as_deref(), Some("tech1"));

    let repair = shop
        .repair
        .complete_repair(
            &repair.id,
            vec![PartInput {
                component_id: screen.id.clone(),
                qty: 1,
                unit_price: None,
            }],
        )
        .unwrap();
    assert_eq!(repair.status, RepairStatus::Repaired);
    assert!(repair.repaired_at.is_some());
    assert_eq!(repair.parts.len(), 1);
    assert_eq!(repair.parts[0].unit_price, 16000);
    assert_eq!(repair.total(), 5000 + 16000);
    assert_eq!(shop.inventory.get_component(&screen.id).unwrap().stock, 2);

    let repair = shop.repair.pickup_repair(&repair.id).unwrap();
    assert_eq!(repair.status, RepairStatus::PickedUp);
    assert!(repair.picked_up_at.is_some());
    let warranty = shop.repair.warranty_for_repair(&repair.id).unwrap();
    assert!(warranty.active());

    // Customer comes back within warranty.
    let repair = shop.repair.rework_repair(&repair.id).unwrap();
    assert_eq!(repair.status, RepairStatus::Reworking);

    let repair = shop
        .repair
        .complete_repair(
            &repair.id,
            vec![PartInput {
                component_id: screen.id.clone(),
                qty: 1,
                unit_price: None,
            }],
        )
        .unwrap();
    assert_eq!(repair.rework_count, 1);
    assert_eq!(repair.parts.len(), 2);
    // The rework part is free for the customer.
    assert_eq!(repair.parts[1].unit_price, 0);
    assert_eq!(repair.total(), 5000 + 16000);
    assert_eq!(shop.inventory.get_component(&screen.id).unwrap().stock, 1);

    let repair = shop.repair.pickup_repair(&repair.id).unwrap();
    assert_eq!(repair.status, RepairStatus::PickedUp);
    // The warranty clock is not reset by the rework pickup.
    let warranty_after = shop.repair.warranty_for_repair(&repair.id).unwrap();
    assert_eq!(warranty_after.id, warranty.id);
    assert_eq!(warranty_after.started_at, warranty.started_at);

    // Both consumptions are in the ledger at full price.
    let movements = shop
        .inventory
        .movements(
            &ListParams::default(),
            &MovementFilter {
                kind: Some(MovementKind::Repair),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(movements.total, 2);
    assert!(movements
        .items
        .iter()
        .all(|m| m.ref_id.as_deref() == Some(repair.id.as_str())));
    assert!(movements.items.iter().all(|m| m.unit_price == 16000));
}

#[test]
fn completing_without_stock_conflicts_and_consumes_nothing() {
    let shop = shop();
    let customer = walk_in_customer(&shop);
    let screen = stocked_component(&shop, "iPhone 12 屏幕", 0);

    let repair = ticket(&shop, &customer, "碎屏");
    shop.repair.start_repair(&repair.id, None).unwrap();

    let err = shop
        .repair
        .complete_repair(
            &repair.id,
            vec![PartInput {
                component_id: screen.id.clone(),
                qty: 1,
                unit_price: None,
            }],
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let repair = shop.repair.get_repair(&repair.id).unwrap();
    assert_eq!(repair.status, RepairStatus::Repairing);
    assert!(repair.parts.is_empty());

    let movements = shop
        .inventory
        .movements(&ListParams::default(), &MovementFilter::default())
        .unwrap();
    assert_eq!(movements.total, 0);
}

#[test]
fn rework_requires_pickup_first() {
    let shop = shop();
    let customer = walk_in_customer(&shop);

    let repair = ticket(&shop, &customer, "不开机");
    shop.repair.start_repair(&repair.id, None).unwrap();

    let err = shop.repair.rework_repair(&repair.id).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn cancel_is_limited_to_open_tickets() {
    let shop = shop();
    let customer = walk_in_customer(&shop);

    let open = ticket(&shop, &customer, "不开机");
    let cancelled = shop.repair.cancel_repair(&open.id).unwrap();
    assert_eq!(cancelled.status, RepairStatus::Cancelled);

    // A cancelled ticket takes no further edits.
    let err = shop
        .repair
        .update_repair(&cancelled.id, serde_json::json!({"fee": 100}))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let done = ticket(&shop, &customer, "碎屏");
    shop.repair.start_repair(&done.id, None).unwrap();
    shop.repair.complete_repair(&done.id, vec![]).unwrap();
    shop.repair.pickup_repair(&done.id).unwrap();
    let err = shop.repair.cancel_repair(&done.id).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn patch_cannot_touch_snapshots_or_status() {
    let shop = shop();
    let customer = walk_in_customer(&shop);
    let repair = ticket(&shop, &customer, "碎屏");

    let patched = shop
        .repair
        .update_repair(
            &repair.id,
            serde_json::json!({
                "fee": 6000,
                "note": "加急",
                "status": "PICKED_UP",
                "customerName": "别人",
            }),
        )
        .unwrap();
    assert_eq!(patched.fee, 6000);
    assert_eq!(patched.note.as_deref(), Some("加急"));
    assert_eq!(patched.status, RepairStatus::Pending);
    assert_eq!(patched.customer_name, "张伟");
}

#[test]
fn create_snapshots_catalog_model_name() {
    let shop = shop();
    let customer = walk_in_customer(&shop);

    let brand = shop.catalog.create_brand("Apple".into()).unwrap();
    let model = shop
        .catalog
        .create_phone_model(brand.id.clone(), "iPhone 12".into())
        .unwrap();

    let repair = shop
        .repair
        .create_repair(CreateRepair {
            customer_id: customer.id.clone(),
            phone_model_id: Some(model.id.clone()),
            phone_model_name: None,
            imei: None,
            fault: "进水".into(),
            fee: 0,
            technician_id: None,
            note: None,
        })
        .unwrap();
    assert_eq!(repair.phone_model_name, "iPhone 12");
    assert_eq!(repair.phone_model_id.as_deref(), Some(model.id.as_str()));

    let err = shop
        .repair
        .create_repair(CreateRepair {
            customer_id: "nobody".into(),
            phone_model_id: None,
            phone_model_name: Some("iPhone 12".into()),
            imei: None,
            fault: "进水".into(),
            fee: 0,
            technician_id: None,
            note: None,
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[test]
fn stats_cover_every_status() {
    let shop = shop();
    let customer = walk_in_customer(&shop);

    ticket(&shop, &customer, "碎屏");
    let started = ticket(&shop, &customer, "不开机");
    shop.repair.start_repair(&started.id, None).unwrap();

    let stats = shop.repair.stats().unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_status.len(), 6);

    let count_of = |status: RepairStatus| {
        stats
            .by_status
            .iter()
            .find(|s| s.status == status)
            .map(|s| s.count)
            .unwrap()
    };
    assert_eq!(count_of(RepairStatus::Pending), 1);
    assert_eq!(count_of(RepairStatus::Repairing), 1);
    assert_eq!(count_of(RepairStatus::Cancelled), 0);
}
