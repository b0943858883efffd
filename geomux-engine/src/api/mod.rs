//! HTTP API handlers
//!
//! - `/health` - liveness and uptime
//! - `/api/geocode/*` - aggregation modes, refinement pipeline, place details
//! - `/api/providers` - provider configuration CRUD
//! - `/api/parameters` - runtime parameter store

pub mod geocode;
pub mod health;
pub mod parameters;
pub mod providers;

pub use geocode::geocode_routes;
pub use health::health_routes;
pub use parameters::parameter_routes;
pub use providers::provider_routes;
