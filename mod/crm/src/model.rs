use serde::{Deserialize, Serialize};

/// A customer. The phone number is the natural key the counter looks
/// people up by.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,

    /// Unique across the shop.
    pub phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wechat: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub wechat: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_json_uses_camel_case() {
        let json = serde_json::json!({
            "id": "c1",
            "name": "张伟",
            "phone": "13800000001",
            "createdAt": "2026-01-01T00:00:00+00:00",
            "updatedAt": "2026-01-01T00:00:00+00:00",
        });
        let c: Customer = serde_json::from_value(json).unwrap();
        assert_eq!(c.name, "张伟");
        assert!(c.wechat.is_none());
    }
}
