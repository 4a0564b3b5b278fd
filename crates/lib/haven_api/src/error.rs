//! Typed error taxonomy returned to GraphQL resolvers.
//!
//! Every code path out of the orchestrator produces one of these kinds;
//! anything unexpected is wrapped as `Unknown` rather than leaked. Only
//! informational (validation) errors expose structured detail to the
//! caller; everything else returns a generic message while full detail is
//! logged.

use serde_json::json;
use thiserror::Error;
use tracing::error;

use haven_core::auth::validate::FieldError;

/// Convenience alias for service return types.
pub type ApiResult<T> = Result<T, ApiError>;

/// Severity tag distinguishing UI-displayable responses from internal
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Safe to render directly in the UI (field-level validation).
    Info,
    /// Internal; caller gets the code and a generic message only.
    Error,
}

/// Errors produced by the auth orchestrator.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Client headers are invalid")]
    ClientInvalid,

    #[error("Input validation failed")]
    Validation(Vec<FieldError>),

    #[error("Account creation failed")]
    AccountCreationFailed,

    #[error("Session creation failed")]
    SessionCreationFailed,

    #[error("Token generation failed")]
    TokenGenerationFailed,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Something went wrong")]
    Unknown(String),
}

impl ApiError {
    /// Stable error code carried in the GraphQL `extensions`.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ClientInvalid => "CLIENT_HEADERS_INVALID",
            ApiError::Validation(_) => "INVALID_INPUT",
            ApiError::AccountCreationFailed => "ACCOUNT_CREATION_FAILED",
            ApiError::SessionCreationFailed => "SESSION_CREATION_FAILED",
            ApiError::TokenGenerationFailed => "TOKEN_GENERATION_FAILED",
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ApiError::Validation(_) => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Field-level detail, present only for validation errors.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// GraphQL-shaped `extensions` object: `{code, response}` where
    /// `response` is withheld unless the severity is informational.
    pub fn extensions(&self) -> serde_json::Value {
        let response = match self.severity() {
            Severity::Info => self
                .field_errors()
                .map(|errors| json!({ "level": "INFO", "errors": errors }))
                .unwrap_or(serde_json::Value::Null),
            Severity::Error => serde_json::Value::Null,
        };
        json!({ "code": self.code(), "response": response })
    }

    /// Wrap an unexpected failure, logging the detail that is withheld from
    /// the caller.
    pub fn unknown(context: &'static str, detail: impl std::fmt::Display) -> ApiError {
        error!(context, %detail, "unexpected error");
        ApiError::Unknown(detail.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_expose_structured_detail() {
        let err = ApiError::Validation(vec![FieldError::new("email", "Email address is not valid")]);
        assert_eq!(Severity::Info, err.severity());
        let ext = err.extensions();
        assert_eq!("INVALID_INPUT", ext["code"]);
        assert_eq!("email", ext["response"]["errors"][0]["field"]);
    }

    #[test]
    fn internal_errors_withhold_detail() {
        let err = ApiError::Unknown("connection reset by peer".into());
        assert_eq!(Severity::Error, err.severity());
        assert!(err.extensions()["response"].is_null());
        assert_eq!("Something went wrong", err.to_string());
    }
}
