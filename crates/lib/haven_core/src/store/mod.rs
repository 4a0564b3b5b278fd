//! Store traits for the auth core.
//!
//! The orchestrator and session manager are persistence-agnostic: they talk
//! to these traits. `postgres` is the production implementation, `memory`
//! backs tests and embedded/dev runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{Client, NewUser, Session, User};

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("not found: {0}")]
    NotFound(&'static str),
}

/// Owns user records. The auth core only creates, reads, and links sessions;
/// verification-flag mutation belongs to the (external) verification flows.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Uniqueness probe used by sign-up validation.
    async fn exists_by_email_or_phone(&self, email: &str, phone: &str)
    -> Result<bool, StoreError>;

    /// Replace the user's session reference with `session_row_id`.
    /// Last-writer-wins under concurrent logins.
    async fn attach_session(&self, user_id: &str, session_row_id: &str)
    -> Result<(), StoreError>;
}

/// Read-only registry of API-consuming applications.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn find_by_key(&self, key: &str) -> Result<Option<Client>, StoreError>;
}

/// Owns session records. Sessions are immutable after insert; expiry is
/// enforced on read so a stale row behaves like a missing one.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: Session) -> Result<(), StoreError>;

    /// Look up by the opaque `session_id`. Expired sessions are not returned.
    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    /// Remove a session (logout, refresh rotation).
    async fn delete_by_session_id(&self, session_id: &str) -> Result<(), StoreError>;
}
