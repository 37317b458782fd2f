//! # API Shared
//!
//! Shared definitions for the knowledge-base HTTP API.
//!
//! Contains:
//! - Wire types for request/response bodies (`dto` module)
//! - Route paths, so the server and the mirror client cannot drift apart
//! - The `HealthService` used by the health endpoint
//!
//! Used by `api-rest` (server side) and `kb-core` (mirror client side).

pub mod dto;
pub mod health;
pub mod paths;

pub use dto::*;
pub use health::HealthService;
