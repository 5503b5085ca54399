use serde::{Deserialize, Serialize};

/// Role claim granted to the virtual root account from the server config.
pub const ROOT_ROLE: &str = "auth:root";

/// A JWT session record, used for token refresh and revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session id (UUIDv4, no dashes).
    pub id: String,

    /// User id that owns this session.
    pub user_id: String,

    /// RFC 3339 timestamp when the token was issued.
    pub issued_at: String,

    /// RFC 3339 timestamp when the refresh token expires.
    pub expires_at: String,

    /// Whether this session has been revoked.
    #[serde(default)]
    pub revoked: bool,
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,

    /// User display name.
    pub name: String,

    /// Role claims, e.g. `role:admin` or `auth:root`.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Session id (for refresh/revoke).
    pub sid: String,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Whether these claims carry admin rights.
    pub fn is_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|r| r == ROOT_ROLE || r == "role:admin")
    }
}

/// Request body for password login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for changing one's own password.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

/// Request body for an admin setting someone's password.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPassword {
    pub password: String,
}

/// Token pair returned after login or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_detection() {
        let mut claims = Claims {
            sub: "u1".into(),
            name: "x".into(),
            roles: vec!["role:clerk".into()],
            sid: "s1".into(),
            iat: 0,
            exp: 0,
        };
        assert!(!claims.is_admin());

        claims.roles = vec!["role:admin".into()];
        assert!(claims.is_admin());

        claims.roles = vec![ROOT_ROLE.to_string()];
        assert!(claims.is_admin());
    }
}
