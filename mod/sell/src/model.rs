use serde::{Deserialize, Serialize};

use fixerp_staging::CartLine;

/// What kind of thing is on the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Accessory,
    SimCard,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Accessory => "ACCESSORY",
            Category::SimCard => "SIM_CARD",
            Category::Other => "OTHER",
        }
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payment {
    Cash,
    Wechat,
    Alipay,
    Card,
}

impl Payment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Payment::Cash => "CASH",
            Payment::Wechat => "WECHAT",
            Payment::Alipay => "ALIPAY",
            Payment::Card => "CARD",
        }
    }
}

/// A sellable item at the front counter, separate from repair components.
///
/// `stock` moves through checkout, void and `@restock`; patches can't
/// touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellItem {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub purchase_price: i64,
    pub public_price: i64,
    pub stock: i64,
    /// Inactive items stay on record but can't be sold.
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

/// Body for creating a sell item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSellItem {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub barcode: Option<String>,
    pub purchase_price: i64,
    pub public_price: i64,
    /// Opening count; later adjustments go through `@restock`.
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Filters for the item list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// One line in a POS cart and on a finished sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosLine {
    pub item_id: String,
    pub name: String,
    pub qty: i64,
    /// Defaults to the item's public price; may be overridden for haggling.
    pub unit_price: i64,
}

impl CartLine for PosLine {
    fn line_key(&self) -> &str {
        &self.item_id
    }

    fn merge(&mut self, incoming: Self) {
        self.qty += incoming.qty;
        self.name = incoming.name;
        self.unit_price = incoming.unit_price;
    }
}

/// Body for putting a line into a POS cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosLineInput {
    pub item_id: String,
    pub qty: i64,
    #[serde(default)]
    pub unit_price: Option<i64>,
}

/// A completed checkout. Lines are snapshots; `sale_items` rows carry the
/// same data for per-item history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub lines: Vec<PosLine>,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub payment: Payment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub cashier_id: String,
    #[serde(default)]
    pub voided: bool,
    pub created_at: String,
}

/// Body of `@checkout`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub payment: Payment,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub discount: Option<i64>,
}

/// Filters for the sales list. `date` selects one calendar day
/// (`YYYY-MM-DD`, UTC).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub payment: Option<Payment>,
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub voided: Option<bool>,
}

/// Daily revenue figures, voided sales excluded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub count: i64,
    pub revenue: i64,
}
