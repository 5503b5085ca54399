use serde::{Deserialize, Serialize};

/// Staff role. Admins manage accounts and settings; clerks run the counter;
/// technicians work repair tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Clerk,
    Technician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Clerk => "clerk",
            Role::Technician => "technician",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff account. The password hash lives in its own column, never in the
/// serialized record, so it can't leak through an API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Login name, unique across the shop.
    pub username: String,

    /// Display name.
    pub name: String,

    /// Staff role.
    pub role: Role,

    /// Whether the account is active. Deactivated staff cannot log in.
    #[serde(default = "default_true")]
    pub active: bool,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a new staff account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub name: String,
    pub role: Role,
    pub password: String,
}

fn default_true() -> bool {
    true
}
