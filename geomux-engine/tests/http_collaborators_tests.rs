//! HTTP-backed provider, AI refiner and places client against a local upstream

mod helpers;

use async_trait::async_trait;
use geomux_common::db::parameters::{
    AI_API_KEY, AI_ENDPOINT, PLACES_API_KEY, PLACES_DETAILS_ENDPOINT, PLACES_ENDPOINT,
};
use geomux_common::ProviderDescriptor;
use geomux_engine::providers::HttpGeocodingProvider;
use geomux_engine::services::{HttpAddressRefiner, HttpPlacesClient};
use geomux_engine::types::{
    AddressRefiner, GeocodeError, GeocodingProvider, LatLng, ParameterStore, PlacesSearch,
};
use helpers::spawn_upstream;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// In-memory parameter store
struct MapParams(HashMap<String, String>);

impl MapParams {
    fn new(entries: &[(&str, String)]) -> Arc<Self> {
        Arc::new(Self(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ))
    }
}

#[async_trait]
impl ParameterStore for MapParams {
    async fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

fn provider(base: &str, path: &str) -> HttpGeocodingProvider {
    HttpGeocodingProvider::new(
        ProviderDescriptor {
            name: "Stub".to_string(),
            endpoint_template: format!("{}/{}?address={{address}}&key={{apiKey}}", base, path),
            api_key: "stub-key".to_string(),
            priority: 1,
            extra: BTreeMap::new(),
        },
        Client::new(),
    )
}

// =============================================================================
// Geocoding provider
// =============================================================================

#[tokio::test]
async fn test_provider_success_round_trip() {
    let base = spawn_upstream().await;
    let response = provider(&base, "geocode")
        .geocode("123 Main St, Apt #4 & Co")
        .await
        .unwrap();

    assert_eq!(response.status, "OK");
    // Address arrived intact after escaping; key substituted raw
    assert_eq!(response.results[0].formatted_address, "123 Main St, Apt #4 & Co");
    assert_eq!(response.results[0].place_id.as_deref(), Some("stub-key"));
    assert_eq!(
        response.results[0].coordinates(),
        Some(LatLng { lat: 40.7128, lng: -74.006 })
    );
}

#[tokio::test]
async fn test_provider_http_error() {
    let base = spawn_upstream().await;
    let result = provider(&base, "fail").geocode("x").await;

    match result {
        Err(GeocodeError::Provider { provider, message }) => {
            assert_eq!(provider, "Stub");
            assert!(message.contains("500"), "message: {}", message);
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_provider_parse_error() {
    let base = spawn_upstream().await;
    let result = provider(&base, "garbage").geocode("x").await;
    assert!(matches!(result, Err(GeocodeError::Provider { .. })));
}

#[tokio::test]
async fn test_provider_unreachable() {
    // Port 9 (discard) on localhost is not served
    let result = provider("http://127.0.0.1:9", "geocode").geocode("x").await;
    assert!(matches!(result, Err(GeocodeError::Provider { .. })));
}

// =============================================================================
// AI refiner
// =============================================================================

fn refiner(base: &str, path: &str) -> HttpAddressRefiner {
    HttpAddressRefiner::new(
        Client::new(),
        MapParams::new(&[
            (AI_ENDPOINT, format!("{}/{}", base, path)),
            (AI_API_KEY, "ai-key".to_string()),
        ]),
    )
}

#[tokio::test]
async fn test_refiner_returns_trimmed_text() {
    let base = spawn_upstream().await;
    let refined = refiner(&base, "complete").refine("123 main st").await.unwrap();
    assert_eq!(refined, "123 Main Street, Springfield");
}

#[tokio::test]
async fn test_refiner_blank_text_keeps_input() {
    let base = spawn_upstream().await;
    let refined = refiner(&base, "complete-blank").refine("123 main st").await.unwrap();
    assert_eq!(refined, "123 main st");
}

#[tokio::test]
async fn test_refiner_without_choices_fails() {
    let base = spawn_upstream().await;
    let result = refiner(&base, "complete-nochoices").refine("123 main st").await;
    assert!(matches!(result, Err(GeocodeError::Collaborator { .. })));
}

#[tokio::test]
async fn test_refiner_rejected_key_fails() {
    let base = spawn_upstream().await;
    let refiner = HttpAddressRefiner::new(
        Client::new(),
        MapParams::new(&[
            (AI_ENDPOINT, format!("{}/complete", base)),
            (AI_API_KEY, "wrong".to_string()),
        ]),
    );

    match refiner.refine("123 main st").await {
        Err(GeocodeError::Collaborator { message, .. }) => assert!(message.contains("401")),
        other => panic!("expected collaborator error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refiner_missing_configuration() {
    let refiner = HttpAddressRefiner::new(Client::new(), MapParams::new(&[]));
    assert_eq!(
        refiner.refine("123 main st").await,
        Err(GeocodeError::ConfigurationMissing(AI_ENDPOINT.to_string()))
    );
}

// =============================================================================
// Places client
// =============================================================================

fn places(base: &str) -> HttpPlacesClient {
    HttpPlacesClient::new(
        Client::new(),
        MapParams::new(&[
            (PLACES_ENDPOINT, format!("{}/nearby", base)),
            (PLACES_DETAILS_ENDPOINT, format!("{}/details", base)),
            (PLACES_API_KEY, "places-key".to_string()),
        ]),
    )
}

#[tokio::test]
async fn test_nearby_search_sends_location_radius_key() {
    let base = spawn_upstream().await;
    let result = places(&base).search_nearby(40.5, -74.25, 250).await.unwrap();

    assert_eq!(result.status, "OK");
    assert_eq!(result.results[0].name, "40.5,-74.25|250|places-key");
    assert_eq!(result.results[0].vicinity.as_deref(), Some("Main St"));
}

#[tokio::test]
async fn test_place_details() {
    let base = spawn_upstream().await;
    let details = places(&base).place_details("place-1").await.unwrap();

    let result = details.result.unwrap();
    assert_eq!(result.place_id, "place-1");
    assert_eq!(result.name, "places-key");
    assert!(result.opening_hours.unwrap().open_now);
}

#[tokio::test]
async fn test_places_missing_key() {
    let client = HttpPlacesClient::new(
        Client::new(),
        MapParams::new(&[(PLACES_ENDPOINT, "http://127.0.0.1:9/nearby".to_string())]),
    );
    assert_eq!(
        client.search_nearby(0.0, 0.0, 100).await,
        Err(GeocodeError::ConfigurationMissing(PLACES_API_KEY.to_string()))
    );
}
