//! Password hashing for the in-process identity provider.

use super::AuthError;

/// Work factor balancing hash strength against interactive sign-in latency.
const COST: u32 = 10;

/// Hash a password with bcrypt. Empty input is refused outright; the
/// validation layer should have rejected it long before this point.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.is_empty() {
        return Err(AuthError::Internal(
            "refusing to hash an empty password".into(),
        ));
    }
    bcrypt::hash(password, COST).map_err(|e| AuthError::Internal(format!("password hash: {e}")))
}

/// Check a password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AuthError::Internal(format!("password verify: {e}")))
}
