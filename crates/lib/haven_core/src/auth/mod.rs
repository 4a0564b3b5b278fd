//! Session/authentication core.
//!
//! Client registry, session manager, token service, input validation, and
//! password hashing, shared by the resolver-facing service layer.

pub mod client;
pub mod jwt;
pub mod password;
pub mod session;
pub mod validate;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("client key is unknown or disabled")]
    ClientInvalid,

    #[error("application id header is missing")]
    MissingAppId,

    #[error("token error: {0}")]
    Token(String),

    #[error("signing configuration incomplete: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}
