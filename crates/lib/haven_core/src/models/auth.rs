//! Auth/session domain models.
//!
//! These are internal domain models; everything GraphQL-facing is serialized
//! camelCase to match the frontend's generated types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role a user holds within the organization. Multi-valued on the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Owner,
    Tenant,
    Admin,
}

impl Role {
    /// Wire/storage representation, e.g. `"TENANT"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Owner => "OWNER",
            Role::Tenant => "TENANT",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse the storage representation. Unknown values map to `None`.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "USER" => Some(Role::User),
            "OWNER" => Some(Role::Owner),
            "TENANT" => Some(Role::Tenant),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// A permission grant: a feature code plus an access level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub feature: String,
    pub access: u8,
}

impl Permission {
    /// The grant every newly signed-up user receives.
    pub fn default_user() -> Permission {
        Permission {
            feature: "DEFAULT_USER".to_string(),
            access: 3,
        }
    }
}

/// Domain user. `id` is assigned by the user store and immutable;
/// `external_auth_id` is the identity provider's stable uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub external_auth_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub profile_url: Option<String>,
    pub email_verified: bool,
    pub verified_by_admin: bool,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    /// Reference to the user's current session row (replace semantics).
    pub session_ref: Option<String>,
}

/// Input for creating a user record after the identity provider accepted
/// the account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub external_auth_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

/// An API-consuming application, looked up by `key` on every
/// session-creating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub key: String,
    pub enabled: bool,
}

/// A session tying a user to a client. Immutable after creation; destroyed
/// by TTL expiry or explicit logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Store row id (time-ordered).
    pub id: String,
    pub client_id: String,
    pub user_id: String,
    /// Opaque correlation id; the `sub` claim of every token minted for
    /// this session.
    pub session_id: String,
    /// `jti` of the session (access) token.
    pub token_id: String,
    /// `jti` of the refresh token. Distinct from `token_id` by construction.
    pub refresh_token_id: String,
    pub user_agent: Option<String>,
    pub ipv4: Option<String>,
    /// Session token lifetime in seconds.
    pub token_expire_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_expire_secs: i64,
    /// Absolute session age in seconds, measured from `created_at`.
    pub session_expire_secs: i64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session's absolute age window has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let deadline = self.created_at + chrono::Duration::seconds(self.session_expire_secs);
        now >= deadline
    }
}

/// The two token kinds the token service signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Session,
    Refresh,
}

/// JWT claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Subject — the session's opaque `session_id`.
    pub sub: String,
    /// Token id; must match the session's stored `token_id` or
    /// `refresh_token_id` depending on the kind.
    pub jti: String,
    /// Issuer — the configured server host.
    pub iss: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// The calling application id, from the request headers.
    pub app_id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_storage_form() {
        for role in [Role::User, Role::Owner, Role::Tenant, Role::Admin] {
            assert_eq!(Some(role), Role::parse(role.as_str()));
        }
        assert_eq!(None, Role::parse("LANDLORD"));
    }

    #[test]
    fn session_expiry_uses_absolute_age() {
        let now = Utc::now();
        let session = Session {
            id: "row".into(),
            client_id: "client".into(),
            user_id: "user".into(),
            session_id: "sid".into(),
            token_id: "tid".into(),
            refresh_token_id: "rid".into(),
            user_agent: None,
            ipv4: None,
            token_expire_secs: 900,
            refresh_token_expire_secs: 86_400,
            session_expire_secs: 60,
            created_at: now - chrono::Duration::seconds(30),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + chrono::Duration::seconds(31)));
    }
}
