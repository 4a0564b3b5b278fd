//! # haven_core
//!
//! Core auth/session domain logic for Haven.

pub mod auth;
pub mod config;
pub mod identity;
pub mod ids;
pub mod migrate;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
