//! In-process identity provider for dev/test runs.
//!
//! Stores bcrypt-hashed credentials and mints opaque id tokens, mirroring
//! the shape of the hosted provider without any network dependency.

use dashmap::DashMap;
use tracing::debug;

use super::IdentityProvider;
use crate::auth::password;
use crate::ids;
use async_trait::async_trait;

struct Account {
    email: String,
    password_hash: String,
}

/// Identity provider keeping accounts and issued id tokens in memory.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    /// Keyed by provider uid.
    accounts: DashMap<String, Account>,
    /// Issued id tokens, keyed by token value → uid.
    tokens: DashMap<String, String>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate with email + password and mint an id token, the way a
    /// frontend SDK would before calling `signIn`.
    pub fn issue_id_token(&self, email: &str, password: &str) -> Option<String> {
        let entry = self.accounts.iter().find(|a| a.email == email)?;
        let matched = password::verify_password(password, &entry.password_hash).ok()?;
        if !matched {
            return None;
        }
        let token = ids::opaque_id();
        self.tokens.insert(token.clone(), entry.key().clone());
        Some(token)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(
        &self,
        _name: &str,
        email: &str,
        password: &str,
        _phone_number: Option<&str>,
    ) -> Option<String> {
        if self.accounts.iter().any(|a| a.email == email) {
            debug!(email, "account already exists");
            return None;
        }
        let password_hash = password::hash_password(password).ok()?;
        let uid = ids::opaque_id();
        self.accounts.insert(
            uid.clone(),
            Account {
                email: email.to_string(),
                password_hash,
            },
        );
        Some(uid)
    }

    async fn verify_id_token(&self, id_token: &str, claimed_uid: &str) -> bool {
        self.tokens
            .get(id_token)
            .map(|uid| *uid == claimed_uid)
            .unwrap_or(false)
    }

    async fn delete_account(&self, external_id: &str) -> bool {
        self.tokens.retain(|_, uid| uid.as_str() != external_id);
        self.accounts.remove(external_id).is_some()
    }
}
