//! Auth configuration.

use std::path::PathBuf;

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

/// Configuration consumed by the token service and session manager.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// JWT signing secret (HS512).
    pub jwt_secret: String,
    /// Token issuer — the server host, checked on every verification.
    pub issuer: String,
    /// Session (access) token lifetime in seconds.
    pub session_token_expire_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_expire_secs: i64,
}

impl AuthConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                            | Default                          |
    /// |-------------------------------------|----------------------------------|
    /// | `JWT_SECRET` / `AUTH_SECRET`        | generated & persisted to file    |
    /// | `SERVER_HOST`                       | `localhost`                      |
    /// | `SESSION_TOKEN_EXPIRE_TIME`         | `900` (15 minutes)               |
    /// | `SESSION_REFRESH_TOKEN_EXPIRE_TIME` | `2592000` (30 days)              |
    pub fn from_env() -> Self {
        Self {
            jwt_secret: resolve_jwt_secret(),
            issuer: std::env::var("SERVER_HOST").unwrap_or_else(|_| "localhost".into()),
            session_token_expire_secs: env_secs("SESSION_TOKEN_EXPIRE_TIME", 15 * 60),
            refresh_token_expire_secs: env_secs("SESSION_REFRESH_TOKEN_EXPIRE_TIME", 30 * 86_400),
        }
    }
}

fn env_secs(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("haven")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_secs_falls_back_on_garbage() {
        assert_eq!(900, env_secs("HAVEN_TEST_MISSING_EXPIRE_KEY", 900));
    }
}
