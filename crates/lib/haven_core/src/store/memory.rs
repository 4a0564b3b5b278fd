//! In-memory store backed by `DashMap`.
//!
//! Used by tests and embedded/dev runs where a PostgreSQL instance is not
//! available. Implements all three store traits on one shareable value.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{ClientStore, SessionStore, StoreError, UserStore};
use crate::ids;
use crate::models::auth::{Client, NewUser, Session, User};

/// All three stores in one process-local value.
#[derive(Default)]
pub struct MemoryAuthStore {
    /// Keyed by user id.
    users: DashMap<String, User>,
    /// Keyed by client key.
    clients: DashMap<String, Client>,
    /// Keyed by opaque session id.
    sessions: DashMap<String, Session>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a client (admin-only in production; test setup here).
    pub fn add_client(&self, client: Client) {
        self.clients.insert(client.key.clone(), client);
    }

    /// Number of live session rows (test assertions).
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl UserStore for MemoryAuthStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let duplicate = self.users.iter().any(|u| u.email == new_user.email);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "user with email {} already exists",
                new_user.email
            )));
        }
        let user = User {
            id: ids::row_id(),
            external_auth_id: new_user.external_auth_id,
            name: new_user.name,
            email: new_user.email,
            phone_number: new_user.phone_number,
            profile_url: None,
            email_verified: false,
            verified_by_admin: false,
            roles: new_user.roles,
            permissions: new_user.permissions,
            session_ref: None,
        };
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn exists_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .users
            .iter()
            .any(|u| u.email == email || u.phone_number.as_deref() == Some(phone)))
    }

    async fn attach_session(
        &self,
        user_id: &str,
        session_row_id: &str,
    ) -> Result<(), StoreError> {
        match self.users.get_mut(user_id) {
            Some(mut user) => {
                user.session_ref = Some(session_row_id.to_string());
                Ok(())
            }
            None => Err(StoreError::NotFound("user")),
        }
    }
}

#[async_trait]
impl ClientStore for MemoryAuthStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(key).map(|c| c.value().clone()))
    }
}

#[async_trait]
impl SessionStore for MemoryAuthStore {
    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        self.sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .get(session_id)
            .filter(|s| !s.is_expired(now))
            .map(|s| s.value().clone()))
    }

    async fn delete_by_session_id(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.remove(session_id);
        Ok(())
    }
}
