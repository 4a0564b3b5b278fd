//! Session manager — creates session records tying a user to a client.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::AuthError;
use crate::config::AuthConfig;
use crate::ids;
use crate::models::auth::Session;
use crate::store::{ClientStore, SessionStore, UserStore};

/// Absolute session age in seconds. Deliberately a constant rather than a
/// per-call parameter so callers cannot mint arbitrarily long-lived
/// sessions.
pub const SESSION_EXPIRE_SECS: i64 = 30 * 86_400;

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    pub client_key: String,
    pub user_id: String,
    pub app_id: String,
    pub user_agent: Option<String>,
    pub ipv4: Option<String>,
}

/// Creates sessions and links them to the owning user.
#[derive(Clone)]
pub struct SessionManager {
    clients: Arc<dyn ClientStore>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl SessionManager {
    pub fn new(
        clients: Arc<dyn ClientStore>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        config: AuthConfig,
    ) -> Self {
        Self {
            clients,
            sessions,
            users,
            config,
        }
    }

    /// Create and persist a session, then attach it to the user record.
    ///
    /// The session row and the user linkage are two single-document writes,
    /// not one transaction: if linkage fails the operation is reported as
    /// failed even though the session row was written. The orphaned row is
    /// logged and ages out via the store TTL.
    pub async fn create_session(&self, input: CreateSessionInput) -> Result<Session, AuthError> {
        if input.app_id.trim().is_empty() {
            return Err(AuthError::MissingAppId);
        }
        let client = match self.clients.find_by_key(&input.client_key).await? {
            Some(client) if client.enabled => client,
            _ => return Err(AuthError::ClientInvalid),
        };

        // All three ids are minted independently; none is derived from user
        // or time data.
        let token_id = ids::opaque_id();
        let refresh_token_id = ids::opaque_id();
        let session_id = ids::opaque_id();
        debug!(%session_id, user_id = %input.user_id, client = %client.name, "creating session");

        let session = Session {
            id: ids::row_id(),
            client_id: client.id,
            user_id: input.user_id.clone(),
            session_id,
            token_id,
            refresh_token_id,
            user_agent: input.user_agent,
            ipv4: input.ipv4,
            token_expire_secs: self.config.session_token_expire_secs,
            refresh_token_expire_secs: self.config.refresh_token_expire_secs,
            session_expire_secs: SESSION_EXPIRE_SECS,
            created_at: Utc::now(),
        };
        self.sessions.insert(session.clone()).await?;

        if let Err(e) = self.users.attach_session(&input.user_id, &session.id).await {
            warn!(
                session_id = %session.session_id,
                user_id = %input.user_id,
                error = %e,
                "session written but user linkage failed; row left to expire"
            );
            return Err(AuthError::Store(e));
        }
        Ok(session)
    }
}
