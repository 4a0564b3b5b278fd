//! Identity provider adapters.
//!
//! Credential proof is delegated to an external identity provider; the core
//! only depends on this capability contract. `firebase` talks to the hosted
//! Google Identity Toolkit API; `memory` is an in-process provider for
//! dev/test runs.

pub mod firebase;
pub mod memory;

use async_trait::async_trait;

/// Capability contract for the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account, returning the provider's stable uid.
    ///
    /// Every failure mode (duplicate email, weak secret, provider outage)
    /// collapses to `None`; the caller must not assume partial state.
    async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone_number: Option<&str>,
    ) -> Option<String>;

    /// Validate a provider-issued identity token against a claimed uid.
    /// True only if the token is valid and embeds exactly that uid.
    async fn verify_id_token(&self, id_token: &str, claimed_uid: &str) -> bool;

    /// Delete an account by the provider uid.
    async fn delete_account(&self, external_id: &str) -> bool;
}
