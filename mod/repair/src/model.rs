use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// How long a repair is covered after pickup.
pub const WARRANTY_DAYS: i64 = 90;

/// Lifecycle of a repair ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    Pending,
    Repairing,
    Repaired,
    PickedUp,
    Reworking,
    Cancelled,
}

impl RepairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::Pending => "PENDING",
            RepairStatus::Repairing => "REPAIRING",
            RepairStatus::Repaired => "REPAIRED",
            RepairStatus::PickedUp => "PICKED_UP",
            RepairStatus::Reworking => "REWORKING",
            RepairStatus::Cancelled => "CANCELLED",
        }
    }

    /// Shop-floor label shown on tickets and receipts.
    pub fn label(&self) -> &'static str {
        match self {
            RepairStatus::Pending => "未维修",
            RepairStatus::Repairing => "维修中",
            RepairStatus::Repaired => "已维修",
            RepairStatus::PickedUp => "已取件",
            RepairStatus::Reworking => "返修中",
            RepairStatus::Cancelled => "已取消",
        }
    }

    /// Valid lifecycle moves. Reworking a picked-up repair additionally
    /// requires an active warranty, which the service checks.
    pub fn can_transition(self, to: RepairStatus) -> bool {
        use RepairStatus::*;
        matches!(
            (self, to),
            (Pending, Repairing)
                | (Pending, Cancelled)
                | (Repairing, Repaired)
                | (Repairing, Cancelled)
                | (Repaired, PickedUp)
                | (PickedUp, Reworking)
                | (Reworking, Repaired)
        )
    }

    /// Closed for edits. A picked-up repair can still re-enter the flow
    /// through a warranty rework.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RepairStatus::PickedUp | RepairStatus::Cancelled)
    }

    pub fn all() -> [RepairStatus; 6] {
        [
            RepairStatus::Pending,
            RepairStatus::Repairing,
            RepairStatus::Repaired,
            RepairStatus::PickedUp,
            RepairStatus::Reworking,
            RepairStatus::Cancelled,
        ]
    }
}

/// A part consumed by a repair, snapshotted onto the ticket.
///
/// `unitPrice` is what the customer is charged; warranty rework parts are
/// recorded at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairPart {
    pub component_id: String,
    pub name: String,
    pub qty: i64,
    pub unit_price: i64,
}

/// A repair ticket. Customer and model fields are snapshots taken at
/// creation so later catalog or CRM edits don't rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repair {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_model_id: Option<String>,
    pub phone_model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
    /// What the customer reported.
    pub fault: String,
    /// Labor charge in cents; parts are on top.
    pub fee: i64,
    pub status: RepairStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<String>,
    #[serde(default)]
    pub parts: Vec<RepairPart>,
    #[serde(default)]
    pub rework_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repaired_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<String>,
}

impl Repair {
    /// Labor plus parts, in cents.
    pub fn total(&self) -> i64 {
        self.fee
            + self
                .parts
                .iter()
                .map(|p| p.qty * p.unit_price)
                .sum::<i64>()
    }
}

/// Body for creating a repair ticket. When `phoneModelId` is given the
/// model name is snapshotted from the catalog, otherwise `phoneModelName`
/// is taken as free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepair {
    pub customer_id: String,
    #[serde(default)]
    pub phone_model_id: Option<String>,
    #[serde(default)]
    pub phone_model_name: Option<String>,
    #[serde(default)]
    pub imei: Option<String>,
    pub fault: String,
    #[serde(default)]
    pub fee: i64,
    #[serde(default)]
    pub technician_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// One part entry in a `@complete` body. When `unitPrice` is omitted the
/// component's public price is charged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartInput {
    pub component_id: String,
    pub qty: i64,
    #[serde(default)]
    pub unit_price: Option<i64>,
}

/// One row of the status breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: RepairStatus,
    pub label: &'static str,
    pub count: i64,
}

/// Counts returned by the stats endpoint, in lifecycle order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairStats {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
}

/// Filters for the repair list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairFilter {
    #[serde(default)]
    pub status: Option<RepairStatus>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub technician_id: Option<String>,
}

/// Warranty opened when a repaired phone is picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warranty {
    pub id: String,
    pub repair_id: String,
    pub customer_id: String,
    pub started_at: String,
    pub expires_at: String,
    pub created_at: String,
}

impl Warranty {
    /// Whether the warranty covers the given moment.
    pub fn active_at(&self, now: &str) -> bool {
        match (
            DateTime::parse_from_rfc3339(&self.expires_at),
            DateTime::parse_from_rfc3339(now),
        ) {
            (Ok(expires), Ok(now)) => now < expires,
            _ => false,
        }
    }

    pub fn active(&self) -> bool {
        self.active_at(&fixerp_core::now_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        use RepairStatus::*;
        assert!(Pending.can_transition(Repairing));
        assert!(Pending.can_transition(Cancelled));
        assert!(Repairing.can_transition(Repaired));
        assert!(Repaired.can_transition(PickedUp));
        assert!(PickedUp.can_transition(Reworking));
        assert!(Reworking.can_transition(Repaired));

        assert!(!Pending.can_transition(Repaired));
        assert!(!Repaired.can_transition(Cancelled));
        assert!(!Reworking.can_transition(Cancelled));
        assert!(!Cancelled.can_transition(Repairing));
        assert!(!PickedUp.can_transition(PickedUp));
    }

    #[test]
    fn total_adds_labor_and_parts() {
        let repair = Repair {
            id: "r1".into(),
            customer_id: "c1".into(),
            customer_name: "张伟".into(),
            phone: "13800000001".into(),
            phone_model_id: None,
            phone_model_name: "iPhone 12".into(),
            imei: None,
            fault: "碎屏".into(),
            fee: 5000,
            status: RepairStatus::Repaired,
            technician_id: None,
            parts: vec![
                RepairPart {
                    component_id: "p1".into(),
                    name: "屏幕".into(),
                    qty: 1,
                    unit_price: 14000,
                },
                RepairPart {
                    component_id: "p2".into(),
                    name: "胶条".into(),
                    qty: 2,
                    unit_price: 500,
                },
            ],
            rework_count: 0,
            note: None,
            created_at: "2025-01-01T00:00:00+00:00".into(),
            updated_at: "2025-01-01T00:00:00+00:00".into(),
            repaired_at: None,
            picked_up_at: None,
        };
        assert_eq!(repair.total(), 5000 + 14000 + 1000);
    }

    #[test]
    fn warranty_active_until_expiry() {
        let w = Warranty {
            id: "w1".into(),
            repair_id: "r1".into(),
            customer_id: "c1".into(),
            started_at: "2025-01-01T00:00:00+00:00".into(),
            expires_at: "2025-04-01T00:00:00+00:00".into(),
            created_at: "2025-01-01T00:00:00+00:00".into(),
        };
        assert!(w.active_at("2025-03-31T23:59:59+00:00"));
        assert!(!w.active_at("2025-04-01T00:00:00+00:00"));
        assert!(!w.active_at("not a timestamp"));
    }

    #[test]
    fn status_json_uses_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&RepairStatus::PickedUp).unwrap(),
            "\"PICKED_UP\""
        );
        assert_eq!(RepairStatus::PickedUp.label(), "已取件");
    }
}
