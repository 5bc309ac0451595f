//! # API Shared
//!
//! Shared utilities and definitions for the Fable REST API.
//!
//! Contains:
//! - Request/response DTOs with OpenAPI schemas (`dto` module)
//! - Requester-identity extraction (`auth` module)
//! - The shared `HealthService`

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::{HealthRes, HealthService};
