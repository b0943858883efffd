//! Core types and trait definitions for the geocoding engine
//!
//! Defines the seams between the engine and its collaborators:
//! - **Providers:** `GeocodingProvider` (one templated HTTP geocoder per descriptor)
//! - **Configuration:** `ProviderConfigSource`, `ParameterStore`
//! - **Pipeline collaborators:** `AddressRefiner` (AI correction), `PlacesSearch` (nearby places)
//!
//! Payload models are deliberately permissive: every field defaults when absent
//! so sparse provider responses still parse.

use geomux_common::ProviderDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Geocode payload
// ============================================================================

/// Status value that marks a usable geocode or places payload
pub const STATUS_OK: &str = "OK";

/// Response of a single provider geocode call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

impl GeocodeResponse {
    /// True when `status == "OK"` and at least one result is present
    pub fn is_usable(&self) -> bool {
        self.status == STATUS_OK && !self.results.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub partial_match: bool,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

impl GeocodeResult {
    pub fn coordinates(&self) -> Option<LatLng> {
        self.geometry.as_ref().and_then(|g| g.location)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LatLng>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

// ============================================================================
// Places payload
// ============================================================================

/// Nearby search result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacesResult {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub results: Vec<PlaceItem>,
    #[serde(default)]
    pub html_attributions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceItem {
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
}

/// Place details lookup result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PlaceDetailResult>,
    #[serde(default)]
    pub html_attributions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetailResult {
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub international_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub open_now: bool,
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

// ============================================================================
// Aggregation and refinement results
// ============================================================================

/// Provider selection policy for a plain geocode request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeMode {
    /// Race the best-priority providers, first success wins
    First,
    /// Union of every provider's successful responses
    All,
    /// Successful responses keyed by provider name, restricted to these priorities
    Group(BTreeSet<i32>),
    /// One named provider
    Provider(String),
}

/// Result shape of an aggregation, one variant per mode family
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregationOutcome {
    Single(GeocodeResponse),
    /// Completion order, not configuration order
    Union(Vec<GeocodeResponse>),
    /// Providers without a success are absent
    Grouped(BTreeMap<String, Vec<GeocodeResponse>>),
}

/// Accumulated state of one refine-and-geocode request
///
/// Written by one pipeline stage at a time; returned to the caller when done.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementContext {
    pub request_id: Uuid,
    pub original_address: String,
    pub refined_address: String,
    pub geocode_results: Vec<GeocodeResponse>,
    pub coordinates: Option<LatLng>,
    pub nearby_places: Option<PlacesResult>,
    pub used_radius: Option<u32>,
    pub process_log: Vec<String>,
}

impl RefinementContext {
    pub fn new(original_address: impl Into<String>) -> Self {
        let original_address = original_address.into();
        Self {
            request_id: Uuid::new_v4(),
            refined_address: original_address.clone(),
            original_address,
            geocode_results: Vec::new(),
            coordinates: None,
            nearby_places: None,
            used_radius: None,
            process_log: Vec::new(),
        }
    }

    pub fn log(&mut self, entry: impl Into<String>) {
        self.process_log.push(entry.into());
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Engine error taxonomy
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// Empty or otherwise invalid request input
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Upstream HTTP or parse failure of one provider
    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("No provider succeeded for address '{0}'")]
    NoProvidersSucceeded(String),

    #[error("Provider '{0}' returned no results")]
    NoResultsFromProvider(String),

    /// A required parameter is not configured in any source
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// AI refinement or places upstream failure
    #[error("{service} failed: {message}")]
    Collaborator { service: String, message: String },

    /// Provider configuration could not be read
    #[error("Provider configuration unavailable: {0}")]
    ConfigSource(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

// ============================================================================
// Traits
// ============================================================================

/// One callable geocoding provider
///
/// Implementations are stateless and safe for concurrent use. No retries and
/// no timeout of their own: the caller imposes deadlines.
#[async_trait::async_trait]
pub trait GeocodingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Lower is preferred
    fn priority(&self) -> i32;

    async fn geocode(&self, address: &str) -> Result<GeocodeResponse, GeocodeError>;
}

/// Source of provider descriptors
#[async_trait::async_trait]
pub trait ProviderConfigSource: Send + Sync {
    async fn list_provider_configs(&self) -> Result<Vec<ProviderDescriptor>, GeocodeError>;

    /// Case-insensitive lookup; `None` when no provider has this name
    async fn get_provider_config(
        &self,
        name: &str,
    ) -> Result<Option<ProviderDescriptor>, GeocodeError>;
}

/// Name → value lookup for collaborator endpoints and keys
#[async_trait::async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get(&self, name: &str) -> Option<String>;

    /// Like `get`, but absence is `ConfigurationMissing`
    async fn require(&self, name: &str) -> Result<String, GeocodeError> {
        self.get(name)
            .await
            .ok_or_else(|| GeocodeError::ConfigurationMissing(name.to_string()))
    }
}

/// AI address correction
#[async_trait::async_trait]
pub trait AddressRefiner: Send + Sync {
    async fn refine(&self, address: &str) -> Result<String, GeocodeError>;
}

/// Nearby places lookup
#[async_trait::async_trait]
pub trait PlacesSearch: Send + Sync {
    async fn search_nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: u32,
    ) -> Result<PlacesResult, GeocodeError>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, GeocodeError>;
}
