//! Client registry — admission check for API-consuming applications.

use std::sync::Arc;

use tracing::debug;

use crate::store::ClientStore;

/// Validates that a request identifies a known, enabled client.
#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<dyn ClientStore>,
}

impl ClientRegistry {
    pub fn new(clients: Arc<dyn ClientStore>) -> Self {
        Self { clients }
    }

    /// True only for an existing, enabled client.
    ///
    /// Missing key, unknown key, disabled client, and store errors all
    /// collapse to `false` so the response does not reveal which case
    /// occurred. Read-only, idempotent.
    pub async fn validate_client(&self, client_key: Option<&str>) -> bool {
        let Some(key) = client_key.filter(|k| !k.trim().is_empty()) else {
            return false;
        };
        match self.clients.find_by_key(key).await {
            Ok(Some(client)) => client.enabled,
            Ok(None) => false,
            Err(e) => {
                debug!(error = %e, "client lookup failed");
                false
            }
        }
    }
}
