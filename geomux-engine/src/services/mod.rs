//! Pipeline collaborators
//!
//! - **parameters** - Database → ENV → TOML parameter resolution
//! - **ai_refiner** - AI address correction over HTTP
//! - **places_client** - Nearby search and place details over HTTP

pub mod ai_refiner;
pub mod parameters;
pub mod places_client;

pub use ai_refiner::HttpAddressRefiner;
pub use parameters::ParameterResolver;
pub use places_client::HttpPlacesClient;
