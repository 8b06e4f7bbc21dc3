//! HTTP request handlers for the dashboard API.

pub mod health;
pub mod seed;

// Re-export handlers (including utoipa __path types for OpenAPI)
pub use health::{__path_health_check, health_check, not_found, openapi};
pub use seed::{__path_seed_database, SeedResponse, seed_database};
