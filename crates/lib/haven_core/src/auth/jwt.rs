//! Token service — signing and verification of session/refresh tokens.
//!
//! Both token kinds are HS512 JWTs bound to a session: `sub` is the
//! session's opaque id and `jti` must equal the `token_id` or
//! `refresh_token_id` recorded on that session. The binding is what stops a
//! token from a superseded session from verifying.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use crate::config::AuthConfig;
use crate::models::auth::{Session, TokenClaims, TokenKind, User};

/// Signs and verifies the two token kinds.
#[derive(Clone)]
pub struct TokenService {
    config: AuthConfig,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Sign a token of the given kind for an established session.
    ///
    /// Fails closed without attempting to sign when the secret or issuer is
    /// unconfigured.
    pub fn generate(
        &self,
        kind: TokenKind,
        app_id: &str,
        user: &User,
        session: &Session,
    ) -> Result<String, AuthError> {
        if self.config.jwt_secret.is_empty() {
            return Err(AuthError::Config("JWT secret is empty".into()));
        }
        if self.config.issuer.is_empty() {
            return Err(AuthError::Config("issuer is empty".into()));
        }
        let (jti, expire_secs) = match kind {
            TokenKind::Session => (session.token_id.clone(), session.token_expire_secs),
            TokenKind::Refresh => (
                session.refresh_token_id.clone(),
                session.refresh_token_expire_secs,
            ),
        };
        let now = Utc::now();
        let claims = TokenClaims {
            sub: session.session_id.clone(),
            jti,
            iss: self.config.issuer.clone(),
            exp: (now + chrono::Duration::seconds(expire_secs)).timestamp(),
            iat: now.timestamp(),
            app_id: app_id.to_string(),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            user_roles: user.roles.clone(),
            permissions: user.permissions.clone(),
        };
        encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Token(format!("jwt encode: {e}")))
    }

    /// Decode a token, checking signature, algorithm, issuer, and expiry.
    ///
    /// Fails closed when the secret or issuer is unconfigured, so a blank
    /// config never verifies tokens signed with an empty key.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        if self.config.jwt_secret.is_empty() {
            return Err(AuthError::Config("JWT secret is empty".into()));
        }
        if self.config.issuer.is_empty() {
            return Err(AuthError::Config("issuer is empty".into()));
        }
        let key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_issuer(&[&self.config.issuer]);
        validation.validate_exp = true;
        decode::<TokenClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Token(format!("jwt decode: {e}")))
    }

    /// Verify a token of the given kind against a session.
    ///
    /// Returns false on any mismatch, expiry, or decode failure; the cause
    /// is logged, never surfaced, so verification cannot be used as an
    /// oracle.
    pub fn verify(&self, token: &str, kind: TokenKind, session: &Session) -> bool {
        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "token decode failed");
                return false;
            }
        };
        if session.is_expired(Utc::now()) {
            debug!(session_id = %session.session_id, "session expired");
            return false;
        }
        if claims.sub != session.session_id {
            debug!("token subject does not match session");
            return false;
        }
        let expected_jti = match kind {
            TokenKind::Session => &session.token_id,
            TokenKind::Refresh => &session.refresh_token_id,
        };
        if claims.jti != *expected_jti {
            debug!("token id does not match session token id");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids;
    use crate::models::auth::{Permission, Role};

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            issuer: "haven.test".into(),
            session_token_expire_secs: 900,
            refresh_token_expire_secs: 86_400,
        }
    }

    fn test_user() -> User {
        User {
            id: "user-1".into(),
            external_auth_id: "ext-1".into(),
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            phone_number: Some("9000000001".into()),
            profile_url: None,
            email_verified: false,
            verified_by_admin: false,
            roles: vec![Role::Tenant],
            permissions: vec![Permission::default_user()],
            session_ref: None,
        }
    }

    fn test_session(token_expire_secs: i64) -> Session {
        Session {
            id: ids::row_id(),
            client_id: "client-1".into(),
            user_id: "user-1".into(),
            session_id: ids::opaque_id(),
            token_id: ids::opaque_id(),
            refresh_token_id: ids::opaque_id(),
            user_agent: None,
            ipv4: None,
            token_expire_secs,
            refresh_token_expire_secs: 86_400,
            session_expire_secs: 30 * 86_400,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn round_trip_verifies_for_both_kinds() {
        let service = TokenService::new(test_config());
        let user = test_user();
        let session = test_session(900);

        for kind in [TokenKind::Session, TokenKind::Refresh] {
            let token = service.generate(kind, "app-1", &user, &session).expect("sign");
            assert!(service.verify(&token, kind, &session));
        }
    }

    #[test]
    fn token_for_session_a_fails_against_session_b() {
        let service = TokenService::new(test_config());
        let user = test_user();
        let session_a = test_session(900);
        let session_b = test_session(900);

        let token = service
            .generate(TokenKind::Session, "app-1", &user, &session_a)
            .expect("sign");
        assert!(service.verify(&token, TokenKind::Session, &session_a));
        assert!(!service.verify(&token, TokenKind::Session, &session_b));
    }

    #[test]
    fn kinds_bind_to_distinct_token_ids() {
        let service = TokenService::new(test_config());
        let user = test_user();
        let session = test_session(900);

        let refresh = service
            .generate(TokenKind::Refresh, "app-1", &user, &session)
            .expect("sign");
        // A refresh token presented as a session token binds to the wrong slot.
        assert!(!service.verify(&refresh, TokenKind::Session, &session));
    }

    #[test]
    fn expired_token_fails() {
        let service = TokenService::new(test_config());
        let user = test_user();
        // exp lands two minutes in the past, beyond the default leeway.
        let session = test_session(-120);

        let token = service
            .generate(TokenKind::Session, "app-1", &user, &session)
            .expect("sign");
        assert!(!service.verify(&token, TokenKind::Session, &session));
    }

    #[test]
    fn issuer_mismatch_fails() {
        let service = TokenService::new(test_config());
        let mut other_config = test_config();
        other_config.issuer = "elsewhere.test".into();
        let other = TokenService::new(other_config);

        let user = test_user();
        let session = test_session(900);
        let token = service
            .generate(TokenKind::Session, "app-1", &user, &session)
            .expect("sign");
        assert!(!other.verify(&token, TokenKind::Session, &session));
    }

    #[test]
    fn empty_secret_fails_closed() {
        let mut config = test_config();
        config.jwt_secret = String::new();
        let service = TokenService::new(config);
        let err = service
            .generate(TokenKind::Session, "app-1", &test_user(), &test_session(900))
            .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn empty_secret_never_verifies_empty_key_signatures() {
        let mut config = test_config();
        config.jwt_secret = String::new();
        let service = TokenService::new(config);
        let user = test_user();
        let session = test_session(900);

        // A token HMAC'd with the empty key, exactly what an attacker would
        // forge against a blank config.
        let now = Utc::now();
        let claims = TokenClaims {
            sub: session.session_id.clone(),
            jti: session.token_id.clone(),
            iss: "haven.test".into(),
            exp: (now + chrono::Duration::seconds(900)).timestamp(),
            iat: now.timestamp(),
            app_id: "app-1".into(),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            user_roles: user.roles.clone(),
            permissions: user.permissions.clone(),
        };
        let forged = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b""),
        )
        .expect("sign with empty key");

        assert!(matches!(service.decode(&forged), Err(AuthError::Config(_))));
        assert!(!service.verify(&forged, TokenKind::Session, &session));
    }

    #[test]
    fn expired_session_rejects_otherwise_valid_token() {
        let service = TokenService::new(test_config());
        let user = test_user();
        let mut session = test_session(900);
        session.session_expire_secs = 1;
        session.created_at = Utc::now() - chrono::Duration::seconds(10);

        let token = service
            .generate(TokenKind::Session, "app-1", &user, &session)
            .expect("sign");
        assert!(!service.verify(&token, TokenKind::Session, &session));
    }
}
