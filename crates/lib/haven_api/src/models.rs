//! Resolver-facing DTOs, serialized camelCase to match the GraphQL schema.

use serde::{Deserialize, Serialize};

use haven_core::models::auth::{Role, User};

/// `signUp(input: ...)` mutation input.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
    pub user_role: Vec<Role>,
}

/// `signIn(input: ...)` mutation input. Credential proof is a
/// provider-issued identity token, not a raw password.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInInput {
    pub email: String,
    pub id_token: String,
}

/// Request-scoped values the transport layer extracts from headers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub client_key: Option<String>,
    pub app_id: Option<String>,
    pub user_agent: Option<String>,
    pub ipv4: Option<String>,
}

/// Where the frontend should navigate next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthStage {
    SignUp,
    SignIn,
    RefreshSession,
    RedirectToEmailVerification,
    RedirectToHome,
}

/// Onboarding state-machine pointer returned with every `Auth` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStep {
    pub previous: AuthStage,
    pub next: AuthStage,
}

/// The `Auth` result of `signUp` / `signIn`: user fields plus the token
/// pair and the next-step indicator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub email_verified: bool,
    pub verified_by_admin: bool,
    pub user_role: Vec<Role>,
    pub profile_url: Option<String>,
    pub token: String,
    pub refresh_token: String,
    pub auth_step: AuthStep,
}

impl Auth {
    /// Compose the response DTO from the domain user and the token pair.
    pub fn from_user(user: &User, token: String, refresh_token: String, auth_step: AuthStep) -> Auth {
        Auth {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            email_verified: user.email_verified,
            verified_by_admin: user.verified_by_admin,
            user_role: user.roles.clone(),
            profile_url: user.profile_url.clone(),
            token,
            refresh_token,
            auth_step,
        }
    }
}
