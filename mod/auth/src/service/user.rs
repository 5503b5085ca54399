//! Staff account management.

use fixerp_core::{ListParams, ServiceError, merge_patch, new_id, now_rfc3339};
use fixerp_sql::Value;

use crate::model::{CreateUser, Role, User};

use super::AuthService;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a plain password with argon2id.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    use argon2::Argon2;
    use password_hash::rand_core::OsRng;
    use password_hash::{PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Verify a password against an argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use password_hash::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn check_password(password: &str) -> Result<(), ServiceError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn user_indexes(user: &User) -> Vec<(&'static str, Value)> {
    vec![
        ("username", Value::Text(user.username.clone())),
        ("role", Value::Text(user.role.as_str().to_string())),
        ("active", Value::Integer(user.active as i64)),
        ("created_at", Value::Text(user.created_at.clone())),
        ("updated_at", Value::Text(user.updated_at.clone())),
    ]
}

impl AuthService {
    /// Create a staff account.
    pub fn create_user(&self, req: CreateUser) -> Result<User, ServiceError> {
        let username = req.username.trim().to_string();
        if username.is_empty() {
            return Err(ServiceError::Validation(
                "username must not be empty".into(),
            ));
        }
        check_password(&req.password)?;

        let now = now_rfc3339();
        let name = if req.name.trim().is_empty() {
            username.clone()
        } else {
            req.name.trim().to_string()
        };
        let user = User {
            id: new_id(),
            username,
            name,
            role: req.role,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        };

        let hash = hash_password(&req.password)?;
        let mut indexes = user_indexes(&user);
        indexes.push(("password_hash", Value::Text(hash)));
        self.insert_record("users", &user.id, &user, &indexes)?;
        Ok(user)
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: &str) -> Result<User, ServiceError> {
        self.get_record("users", id)
    }

    /// List users, optionally filtered by role.
    pub fn list_users(
        &self,
        params: &ListParams,
        role: Option<Role>,
    ) -> Result<(Vec<User>, usize), ServiceError> {
        let mut filters = Vec::new();
        if let Some(role) = role {
            filters.push(("role", Value::Text(role.as_str().to_string())));
        }
        self.list_records("users", &filters, params.limit, params.offset)
    }

    /// Patch a user record (JSON merge patch). The id and timestamps cannot
    /// be patched, and the password has its own operations.
    pub fn update_user(&self, id: &str, patch: serde_json::Value) -> Result<User, ServiceError> {
        let existing = self.get_user(id)?;
        let mut base =
            serde_json::to_value(&existing).map_err(|e| ServiceError::Internal(e.to_string()))?;

        merge_patch(&mut base, &patch);
        base["id"] = serde_json::Value::String(existing.id.clone());
        base["created_at"] = serde_json::Value::String(existing.created_at.clone());
        base["updated_at"] = serde_json::Value::String(now_rfc3339());

        let updated: User =
            serde_json::from_value(base).map_err(|e| ServiceError::Validation(e.to_string()))?;
        if updated.username.trim().is_empty() {
            return Err(ServiceError::Validation(
                "username must not be empty".into(),
            ));
        }

        self.update_record("users", id, &updated, &user_indexes(&updated))?;
        Ok(updated)
    }

    /// Delete a user and all of their sessions.
    pub fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("users", id)?;
        self.sql
            .exec(
                "DELETE FROM sessions WHERE user_id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Set a user's password without checking the old one (admin operation).
    pub fn set_password(&self, id: &str, password: &str) -> Result<(), ServiceError> {
        check_password(password)?;
        let hash = hash_password(password)?;
        let affected = self
            .sql
            .exec(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                &[Value::Text(hash), Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("users/{}", id)));
        }
        Ok(())
    }

    /// Change one's own password, verifying the current one first.
    pub fn change_password(&self, id: &str, old: &str, new: &str) -> Result<(), ServiceError> {
        let hash = self.stored_hash(id)?;
        if !verify_password(old, &hash) {
            return Err(ServiceError::Unauthorized("wrong password".into()));
        }
        self.set_password(id, new)
    }

    fn stored_hash(&self, id: &str) -> Result<String, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT password_hash FROM users WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("users/{}", id)))?;
        row.get_str("password_hash")
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Internal("missing password_hash column".into()))
    }

    /// Look up a user by username and verify their password. Unknown
    /// usernames and wrong passwords are indistinguishable to the caller.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let invalid = || ServiceError::Unauthorized("invalid credentials".into());

        let rows = self
            .sql
            .query(
                "SELECT data, password_hash FROM users WHERE username = ?1",
                &[Value::Text(username.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let row = rows.first().ok_or_else(invalid)?;

        let hash = row
            .get_str("password_hash")
            .ok_or_else(|| ServiceError::Internal("missing password_hash column".into()))?;
        if !verify_password(password, hash) {
            return Err(invalid());
        }

        let data = row
            .get_str("data")
            .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
        let user: User =
            serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
        if !user.active {
            return Err(ServiceError::Unauthorized("user is deactivated".into()));
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fixerp_sql::SqliteStore;

    use super::*;
    use crate::service::AuthConfig;

    fn service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        AuthService::new(sql, AuthConfig::default()).unwrap()
    }

    fn create_clerk(svc: &AuthService, username: &str) -> User {
        svc.create_user(CreateUser {
            username: username.into(),
            name: "Test Clerk".into(),
            role: Role::Clerk,
            password: "secret1".into(),
        })
        .unwrap()
    }

    #[test]
    fn create_and_fetch() {
        let svc = service();
        let user = create_clerk(&svc, "clerk1");
        let fetched = svc.get_user(&user.id).unwrap();
        assert_eq!(fetched.username, "clerk1");
        assert_eq!(fetched.role, Role::Clerk);
        assert!(fetched.active);
    }

    #[test]
    fn duplicate_username_conflicts() {
        let svc = service();
        create_clerk(&svc, "clerk1");
        let err = svc
            .create_user(CreateUser {
                username: "clerk1".into(),
                name: "Other".into(),
                role: Role::Technician,
                password: "secret1".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn short_password_rejected() {
        let svc = service();
        let err = svc
            .create_user(CreateUser {
                username: "clerk1".into(),
                name: String::new(),
                role: Role::Clerk,
                password: "abc".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn credentials_check() {
        let svc = service();
        let user = create_clerk(&svc, "clerk1");

        let ok = svc.verify_credentials("clerk1", "secret1").unwrap();
        assert_eq!(ok.id, user.id);

        let err = svc.verify_credentials("clerk1", "wrong--").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        let err = svc.verify_credentials("nobody", "secret1").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn deactivated_user_cannot_authenticate() {
        let svc = service();
        let user = create_clerk(&svc, "clerk1");
        svc.update_user(&user.id, serde_json::json!({"active": false}))
            .unwrap();
        let err = svc.verify_credentials("clerk1", "secret1").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn change_password_requires_old() {
        let svc = service();
        let user = create_clerk(&svc, "clerk1");

        let err = svc
            .change_password(&user.id, "wrong--", "newpass1")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        svc.change_password(&user.id, "secret1", "newpass1")
            .unwrap();
        svc.verify_credentials("clerk1", "newpass1").unwrap();
    }

    #[test]
    fn patch_keeps_protected_fields() {
        let svc = service();
        let user = create_clerk(&svc, "clerk1");
        let patched = svc
            .update_user(
                &user.id,
                serde_json::json!({"name": "Renamed", "id": "hacked"}),
            )
            .unwrap();
        assert_eq!(patched.id, user.id);
        assert_eq!(patched.name, "Renamed");
        assert_eq!(patched.created_at, user.created_at);
    }

    #[test]
    fn delete_removes_user() {
        let svc = service();
        let user = create_clerk(&svc, "clerk1");
        svc.delete_user(&user.id).unwrap();
        let err = svc.get_user(&user.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn list_filters_by_role() {
        let svc = service();
        create_clerk(&svc, "clerk1");
        svc.create_user(CreateUser {
            username: "tech1".into(),
            name: "Tech".into(),
            role: Role::Technician,
            password: "secret1".into(),
        })
        .unwrap();

        let (all, total) = svc.list_users(&ListParams::default(), None).unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);

        let (techs, total) = svc
            .list_users(&ListParams::default(), Some(Role::Technician))
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(techs[0].username, "tech1");
    }
}
