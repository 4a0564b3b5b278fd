//! # haven_api
//!
//! Resolver-facing auth service layer for Haven. GraphQL resolvers hold an
//! [`AppState`] and call into [`services::auth`]; transport and schema
//! plumbing live outside this crate.

pub mod error;
pub mod models;
pub mod services;

use std::sync::Arc;

use haven_core::auth::client::ClientRegistry;
use haven_core::auth::jwt::TokenService;
use haven_core::auth::session::SessionManager;
use haven_core::config::AuthConfig;
use haven_core::identity::IdentityProvider;
use haven_core::store::{ClientStore, SessionStore, UserStore};

/// Shared application state, constructed once at startup and handed to
/// request handlers by reference.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub registry: ClientRegistry,
    pub session_manager: SessionManager,
    pub tokens: TokenService,
    pub config: AuthConfig,
}

impl AppState {
    /// Wire the auth components over the given stores and provider.
    pub fn new(
        users: Arc<dyn UserStore>,
        clients: Arc<dyn ClientStore>,
        sessions: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        config: AuthConfig,
    ) -> Self {
        Self {
            registry: ClientRegistry::new(clients.clone()),
            session_manager: SessionManager::new(
                clients,
                sessions.clone(),
                users.clone(),
                config.clone(),
            ),
            tokens: TokenService::new(config.clone()),
            users,
            sessions,
            identity,
            config,
        }
    }

    /// Production wiring: one Postgres-backed store for all three traits.
    pub fn postgres(
        pool: sqlx::PgPool,
        identity: Arc<dyn IdentityProvider>,
        config: AuthConfig,
    ) -> Self {
        let store = Arc::new(haven_core::store::postgres::PgAuthStore::new(pool));
        Self::new(
            store.clone(),
            store.clone(),
            store,
            identity,
            config,
        )
    }
}

/// Run embedded database migrations.
///
/// Delegates to `haven_core::migrate::migrate()` which owns the migration
/// files.
pub async fn migrate(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    haven_core::migrate::migrate(pool).await
}
