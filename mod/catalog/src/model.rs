use serde::{Deserialize, Serialize};

/// Phone brand (e.g. Apple, Xiaomi).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Phone model under a brand (e.g. "iPhone 12", "Redmi Note 9").
///
/// Model names are unique within their brand, not globally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhoneModel {
    pub id: String,
    pub brand_id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Parts supplier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,

    /// Contact person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

/// Shop-wide settings. A single row, created on first access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettings {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub address: String,

    /// Free-form notice shown to staff (e.g. a running promotion).
    #[serde(default)]
    pub announcement: String,

    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_json_uses_camel_case() {
        let b = Brand {
            id: "b1".into(),
            name: "Apple".into(),
            created_at: "2026-01-01T00:00:00+00:00".into(),
            updated_at: "2026-01-01T00:00:00+00:00".into(),
        };
        let json = serde_json::to_value(&b).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn supplier_optional_fields_omitted() {
        let s = Supplier {
            id: "s1".into(),
            name: "华强北配件".into(),
            contact: None,
            phone: None,
            address: None,
            note: None,
            created_at: "2026-01-01T00:00:00+00:00".into(),
            updated_at: "2026-01-01T00:00:00+00:00".into(),
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("contact"));
    }
}
