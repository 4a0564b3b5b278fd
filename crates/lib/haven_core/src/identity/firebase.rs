//! Hosted identity provider — Google Identity Toolkit REST API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::IdentityProvider;
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Upper bound on any provider call; a timed-out call is a failed call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider backed by the Google Identity Toolkit (Firebase Auth)
/// REST API.
pub struct FirebaseIdentityProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(rename = "localId")]
    local_id: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
}

impl FirebaseIdentityProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Override the endpoint base (emulator / tests).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            base_url,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, method, self.api_key)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        _phone_number: Option<&str>,
    ) -> Option<String> {
        let body = json!({
            "email": email,
            "password": password,
            "displayName": name,
            "returnSecureToken": false,
        });
        let response = self
            .http
            .post(self.endpoint("signUp"))
            .json(&body)
            .send()
            .await;
        match response {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<SignUpResponse>().await {
                    Ok(created) => {
                        debug!(email, uid = %created.local_id, "provider account created");
                        Some(created.local_id)
                    }
                    Err(e) => {
                        warn!(email, error = %e, "provider signUp response malformed");
                        None
                    }
                }
            }
            Ok(resp) => {
                warn!(email, status = %resp.status(), "provider rejected account creation");
                None
            }
            Err(e) => {
                warn!(email, error = %e, "provider signUp call failed");
                None
            }
        }
    }

    async fn verify_id_token(&self, id_token: &str, claimed_uid: &str) -> bool {
        let body = json!({ "idToken": id_token });
        let response = self
            .http
            .post(self.endpoint("lookup"))
            .json(&body)
            .send()
            .await;
        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<LookupResponse>().await {
                Ok(lookup) => lookup.users.iter().any(|u| u.local_id == claimed_uid),
                Err(e) => {
                    warn!(error = %e, "provider lookup response malformed");
                    false
                }
            },
            Ok(resp) => {
                debug!(status = %resp.status(), "provider rejected id token");
                false
            }
            Err(e) => {
                warn!(error = %e, "provider lookup call failed");
                false
            }
        }
    }

    async fn delete_account(&self, external_id: &str) -> bool {
        let body = json!({ "localId": external_id });
        match self
            .http
            .post(self.endpoint("delete"))
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(uid = external_id, error = %e, "provider delete call failed");
                false
            }
        }
    }
}
