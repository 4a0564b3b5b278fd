//! Service layer consumed by the GraphQL resolvers.

pub mod auth;
