use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use fixerp_core::{ServiceError, new_id};
use fixerp_sql::Value;

use crate::model::{Claims, Session, TokenPair, User};
use crate::service::AuthService;

impl AuthService {
    /// Verify a username/password pair and issue a token pair.
    pub fn login(&self, username: &str, password: &str) -> Result<TokenPair, ServiceError> {
        let user = self.verify_credentials(username, password)?;
        self.issue_tokens(&user)
    }

    /// Issue a JWT token pair (access + refresh) for a user.
    ///
    /// Creates a session record and returns signed tokens.
    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair, ServiceError> {
        let session_id = new_id();
        let now = chrono::Utc::now();
        let access_exp = now + chrono::Duration::seconds(self.config.access_token_ttl);
        let refresh_exp = now + chrono::Duration::seconds(self.config.refresh_token_ttl);

        let access_claims = Claims {
            sub: user.id.clone(),
            name: user.name.clone(),
            roles: vec![format!("role:{}", user.role)],
            sid: session_id.clone(),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
        };

        // Same claims, longer expiry.
        let refresh_claims = Claims {
            exp: refresh_exp.timestamp(),
            ..access_claims.clone()
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("JWT encode failed: {}", e)))?;

        let refresh_token = encode(
            &Header::default(),
            &refresh_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("JWT encode failed: {}", e)))?;

        let session = Session {
            id: session_id,
            user_id: user.id.clone(),
            issued_at: now.to_rfc3339(),
            expires_at: refresh_exp.to_rfc3339(),
            revoked: false,
        };

        self.insert_record(
            "sessions",
            &session.id,
            &session,
            &[
                ("user_id", Value::Text(session.user_id.clone())),
                ("revoked", Value::Integer(0)),
                ("issued_at", Value::Text(session.issued_at.clone())),
                ("expires_at", Value::Text(session.expires_at.clone())),
            ],
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_ttl,
        })
    }

    /// Verify and decode a JWT access token.
    ///
    /// Returns the claims if the signature is valid, the token is not
    /// expired, and the session (if one exists) has not been revoked. Root
    /// tokens carry a session id with no matching row, so a missing session
    /// is not an error.
    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))?;

        let claims = token_data.claims;

        if let Ok(session) = self.get_record::<Session>("sessions", &claims.sid) {
            if session.revoked {
                return Err(ServiceError::Unauthorized("session has been revoked".into()));
            }
        }

        Ok(claims)
    }

    /// Refresh an access token using a refresh token.
    ///
    /// Validates the refresh token, revokes the old session, and issues a
    /// new pair.
    pub fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.verify_token(refresh_token)?;

        let user: User = self
            .get_record("users", &claims.sub)
            .map_err(|_| ServiceError::Unauthorized("user not found".into()))?;

        if !user.active {
            return Err(ServiceError::Unauthorized("user is deactivated".into()));
        }

        self.revoke_session(&claims.sid)?;
        self.issue_tokens(&user)
    }

    /// Revoke a session (its tokens become invalid).
    pub fn revoke_session(&self, session_id: &str) -> Result<(), ServiceError> {
        let mut session: Session = self.get_record("sessions", session_id)?;
        session.revoked = true;

        self.update_record(
            "sessions",
            session_id,
            &session,
            &[("revoked", Value::Integer(1))],
        )?;

        Ok(())
    }

    /// Revoke all active sessions for a user. Returns the number revoked.
    pub fn revoke_all_user_sessions(&self, user_id: &str) -> Result<u64, ServiceError> {
        let affected = self.sql
            .exec(
                "UPDATE sessions SET revoked = 1, data = REPLACE(data, '\"revoked\":false', '\"revoked\":true') WHERE user_id = ?1 AND revoked = 0",
                &[Value::Text(user_id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(affected)
    }

    /// Get a session by id.
    pub fn get_session(&self, id: &str) -> Result<Session, ServiceError> {
        self.get_record("sessions", id)
    }

    /// List active sessions for a user, newest first.
    pub fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Session>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT data FROM sessions WHERE user_id = ?1 AND revoked = 0 ORDER BY issued_at DESC",
                &[Value::Text(user_id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut sessions = Vec::new();
        for row in &rows {
            if let Some(data) = row.get_str("data") {
                let session: Session =
                    serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
                sessions.push(session);
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fixerp_sql::SqliteStore;

    use super::*;
    use crate::model::{CreateUser, ROOT_ROLE, Role};
    use crate::service::AuthConfig;

    fn service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        AuthService::new(sql, AuthConfig::default()).unwrap()
    }

    fn staff(svc: &AuthService, username: &str) -> User {
        svc.create_user(CreateUser {
            username: username.into(),
            name: username.into(),
            role: Role::Clerk,
            password: "secret1".into(),
        })
        .unwrap()
    }

    #[test]
    fn login_issues_verifiable_tokens() {
        let svc = service();
        let user = staff(&svc, "alice");

        let tokens = svc.login("alice", "secret1").unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 86400);

        let claims = svc.verify_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.roles, vec!["role:clerk".to_string()]);
        assert!(!claims.is_admin());
    }

    #[test]
    fn refresh_rotates_session() {
        let svc = service();
        let user = staff(&svc, "bob");

        let tokens1 = svc.issue_tokens(&user).unwrap();
        let tokens2 = svc.refresh_tokens(&tokens1.refresh_token).unwrap();
        assert_ne!(tokens2.access_token, tokens1.access_token);

        // The old session is revoked; the new pair works.
        assert!(svc.verify_token(&tokens1.access_token).is_err());
        let claims = svc.verify_token(&tokens2.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[test]
    fn revoked_session_rejects_token() {
        let svc = service();
        let user = staff(&svc, "carol");

        let tokens = svc.issue_tokens(&user).unwrap();
        let claims = svc.verify_token(&tokens.access_token).unwrap();

        svc.revoke_session(&claims.sid).unwrap();
        assert!(svc.verify_token(&tokens.access_token).is_err());
    }

    #[test]
    fn revoke_all_clears_active_sessions() {
        let svc = service();
        let user = staff(&svc, "dave");

        let tokens1 = svc.issue_tokens(&user).unwrap();
        let tokens2 = svc.issue_tokens(&user).unwrap();

        assert_eq!(svc.list_user_sessions(&user.id).unwrap().len(), 2);
        assert_eq!(svc.revoke_all_user_sessions(&user.id).unwrap(), 2);

        assert!(svc.verify_token(&tokens1.access_token).is_err());
        assert!(svc.verify_token(&tokens2.access_token).is_err());
        assert!(svc.list_user_sessions(&user.id).unwrap().is_empty());
    }

    #[test]
    fn token_without_session_row_still_verifies() {
        // Root tokens are minted from the server config and have no
        // session record behind them.
        let svc = service();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "root".into(),
            name: "root".into(),
            roles: vec![ROOT_ROLE.to_string()],
            sid: new_id(),
            iat: now,
            exp: now + 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(AuthConfig::default().jwt_secret.as_bytes()),
        )
        .unwrap();

        let verified = svc.verify_token(&token).unwrap();
        assert!(verified.is_admin());
    }

    #[test]
    fn garbage_token_rejected() {
        let svc = service();
        assert!(svc.verify_token("this.is.not.a.valid.jwt").is_err());
    }
}
