use serde::{Deserialize, Serialize};

use fixerp_staging::CartLine;

/// Quality grade of a spare part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    /// Factory original part.
    Original,
    /// Third-party part built to the original spec.
    Oem,
    /// Generic aftermarket part.
    Aftermarket,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Original => "ORIGINAL",
            Quality::Oem => "OEM",
            Quality::Aftermarket => "AFTERMARKET",
        }
    }
}

/// A repair component (spare part) tracked with stock.
///
/// Prices are integer cents. `stock` and `purchasePrice` move under
/// transactional commits, never through patches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    pub quality: Quality,
    /// Latest purchase price per unit, updated on every stock-in.
    pub purchase_price: i64,
    /// Price quoted to the customer.
    pub public_price: i64,
    pub stock: i64,
    pub low_stock_threshold: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
    /// Phone models this part fits.
    #[serde(default)]
    pub phone_model_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Body for creating a component. New components start at zero stock;
/// quantities enter through a stock-in commit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComponent {
    pub name: String,
    pub quality: Quality,
    pub purchase_price: i64,
    pub public_price: i64,
    #[serde(default)]
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub phone_model_ids: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Filters for the component list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFilter {
    #[serde(default)]
    pub quality: Option<Quality>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub phone_model_id: Option<String>,
}

/// One line in a stock-in or stock-out cart.
///
/// `name` is a snapshot of the component name at the time the line was
/// added; `unitPrice` is the purchase price per unit in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub component_id: String,
    pub name: String,
    pub qty: i64,
    pub unit_price: i64,
}

impl CartLine for StockLine {
    fn line_key(&self) -> &str {
        &self.component_id
    }

    /// Quantities add up; name and price take the latest value.
    fn merge(&mut self, incoming: Self) {
        self.qty += incoming.qty;
        self.name = incoming.name;
        self.unit_price = incoming.unit_price;
    }
}

/// Body for putting a line into a cart. When `unitPrice` is omitted the
/// component's current purchase price is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInput {
    pub component_id: String,
    pub qty: i64,
    #[serde(default)]
    pub unit_price: Option<i64>,
}

/// Direction and cause of a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Stock-in from a supplier.
    In,
    /// Manual stock-out (damage, loss, counter sale of a part).
    Out,
    /// Consumed by a repair ticket.
    Repair,
    /// Compensating increment when repair consumption is undone.
    Void,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "IN",
            MovementKind::Out => "OUT",
            MovementKind::Repair => "REPAIR",
            MovementKind::Void => "VOID",
        }
    }
}

/// One row of the stock ledger. Every change to a component's stock writes
/// one of these in the same transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub component_id: String,
    pub kind: MovementKind,
    /// Units moved, always positive; `kind` carries the direction.
    pub qty: i64,
    pub unit_price: i64,
    /// Shared by every movement of one commit.
    pub batch_id: String,
    /// Supplier for stock-in, repair ticket for repair movements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: String,
}

/// Filters for the movement ledger.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilter {
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub kind: Option<MovementKind>,
    #[serde(default)]
    pub batch_id: Option<String>,
}

/// What a cart commit returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub batch_id: String,
    pub lines: usize,
}
