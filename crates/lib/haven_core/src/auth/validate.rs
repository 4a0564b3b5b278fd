//! Synchronous sign-up / sign-in input validation.
//!
//! Field-level failures are collected, not short-circuited, so the frontend
//! can render every problem at once. The async uniqueness probe lives in the
//! orchestrator, which appends to the same list.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::auth::Role;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,4}$").expect("email regex")
});

/// Characters accepted as the required "special" password character.
const PASSWORD_SPECIALS: &str = "#?!@$%^&*-";

const PASSWORD_RULES: &str = "1. Password should have minimum 8 characters.\n\
     2. Password should have at least 1 upper case english letter.\n\
     3. Password should have at least 1 lower case english letter.\n\
     4. Password should have at least 1 digit.\n\
     5. Password should have one special character. i.e #?!@$%^&*-";

/// One field-level validation failure, suitable for direct UI display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Fields checked at sign-up, before the identity provider is involved.
#[derive(Debug, Clone)]
pub struct SignUpFields<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub phone_number: &'a str,
    pub roles: &'a [Role],
}

/// Run the synchronous sign-up checks. Empty result means valid.
pub fn validate_sign_up(fields: &SignUpFields<'_>) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if fields.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name should not be empty string"));
    }
    if fields.email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email should not be empty string"));
    }
    if !EMAIL_RE.is_match(fields.email) {
        errors.push(FieldError::new("email", "Email address is not valid"));
    }
    if fields.password.trim().is_empty() {
        errors.push(FieldError::new(
            "password",
            "Password should not be empty string",
        ));
    }
    if !password_is_complex(fields.password) {
        errors.push(FieldError::new("password", PASSWORD_RULES));
    }
    if fields.phone_number.trim().is_empty() {
        errors.push(FieldError::new(
            "phoneNumber",
            "Phone number should not be empty string",
        ));
    }
    if fields.roles.is_empty() {
        errors.push(FieldError::new(
            "userRole",
            "User role should not be empty",
        ));
    }
    errors
}

/// Run the synchronous sign-in checks. Empty result means valid.
pub fn validate_sign_in(email: &str, id_token: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email should not be empty string"));
    }
    if id_token.trim().is_empty() {
        errors.push(FieldError::new(
            "idToken",
            "Token should not be empty string",
        ));
    }
    errors
}

/// Minimum 8 chars with at least one upper, lower, digit, and special.
///
/// `regex` has no lookaheads, so the classes are checked directly.
fn password_is_complex(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}
