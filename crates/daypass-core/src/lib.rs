//! Cross-cutting service plumbing: configuration loading, tracing setup,
//! health endpoints, request ids and wire-format helpers.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
