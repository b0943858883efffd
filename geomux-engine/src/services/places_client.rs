//! Nearby places client
//!
//! - Nearby search: `GET <places_endpoint>?location=<lat>,<lng>&radius=<r>&key=<key>`
//! - Details: `GET <places_details_endpoint>?place_id=<id>&key=<key>`

use crate::types::{GeocodeError, ParameterStore, PlaceDetails, PlacesResult, PlacesSearch};
use async_trait::async_trait;
use geomux_common::db::parameters::{PLACES_API_KEY, PLACES_DETAILS_ENDPOINT, PLACES_ENDPOINT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

const SERVICE: &str = "Places";

pub struct HttpPlacesClient {
    http: Client,
    params: Arc<dyn ParameterStore>,
}

fn error(message: impl Into<String>) -> GeocodeError {
    GeocodeError::Collaborator {
        service: SERVICE.to_string(),
        message: message.into(),
    }
}

impl HttpPlacesClient {
    pub fn new(http: Client, params: Arc<dyn ParameterStore>) -> Self {
        Self { http, params }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, GeocodeError> {
        let response = self
            .http
            .get(endpoint)
            .query(query)
            .send()
            .await
            .map_err(|e| error(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| error(format!("Parse response failed: {}", e)))
    }
}

#[async_trait]
impl PlacesSearch for HttpPlacesClient {
    async fn search_nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: u32,
    ) -> Result<PlacesResult, GeocodeError> {
        let endpoint = self.params.require(PLACES_ENDPOINT).await?;
        let api_key = self.params.require(PLACES_API_KEY).await?;

        debug!(endpoint = %endpoint, lat, lng, radius_meters, "Searching nearby places");

        self.get_json(
            &endpoint,
            &[
                ("location", format!("{},{}", lat, lng)),
                ("radius", radius_meters.to_string()),
                ("key", api_key),
            ],
        )
        .await
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, GeocodeError> {
        if place_id.trim().is_empty() {
            return Err(GeocodeError::Validation("place_id is required".to_string()));
        }
        let endpoint = self.params.require(PLACES_DETAILS_ENDPOINT).await?;
        let api_key = self.params.require(PLACES_API_KEY).await?;

        debug!(endpoint = %endpoint, place_id, "Fetching place details");

        self.get_json(
            &endpoint,
            &[("place_id", place_id.trim().to_string()), ("key", api_key)],
        )
        .await
    }
}
