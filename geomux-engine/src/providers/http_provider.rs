//! HTTP geocoding provider
//!
//! One generic implementation for every configured provider: render the
//! endpoint template, issue a GET, parse the JSON body as a `GeocodeResponse`.
//!
//! The reqwest `Client` is shared across all handles (pooled connections).
//! No client-level timeout is set here; deadlines come from the caller.

use super::template::{EndpointTemplate, TemplateVars, ADDRESS_PLACEHOLDER, API_KEY_PLACEHOLDER};
use crate::types::{GeocodeError, GeocodeResponse, GeocodingProvider};
use async_trait::async_trait;
use geomux_common::ProviderDescriptor;
use reqwest::Client;
use std::collections::BTreeMap;
use tracing::debug;

const REDACTED: &str = "***";

/// Templated HTTP geocoder built from a `ProviderDescriptor`
#[derive(Debug, Clone)]
pub struct HttpGeocodingProvider {
    name: String,
    priority: i32,
    template: EndpointTemplate,
    api_key: String,
    extra: BTreeMap<String, String>,
    http: Client,
}

impl HttpGeocodingProvider {
    pub fn new(descriptor: ProviderDescriptor, http: Client) -> Self {
        Self {
            name: descriptor.name,
            priority: descriptor.priority,
            template: EndpointTemplate::new(descriptor.endpoint_template),
            api_key: descriptor.api_key,
            extra: descriptor.extra,
            http,
        }
    }

    /// Request URL for `address`
    pub fn url_for(&self, address: &str) -> String {
        self.template.render(&self.vars(address, &self.api_key))
    }

    fn vars(&self, address: &str, api_key: &str) -> TemplateVars {
        // Extras first so the built-in placeholders cannot be shadowed
        let vars = self
            .extra
            .iter()
            .fold(TemplateVars::new(), |vars, (k, v)| vars.raw(k.clone(), v.clone()));

        vars.escaped(ADDRESS_PLACEHOLDER, address)
            .raw(API_KEY_PLACEHOLDER, api_key)
    }

    fn error(&self, message: impl Into<String>) -> GeocodeError {
        GeocodeError::Provider {
            provider: self.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl GeocodingProvider for HttpGeocodingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn geocode(&self, address: &str) -> Result<GeocodeResponse, GeocodeError> {
        let url = self.url_for(address);
        debug!(
            provider = %self.name,
            url = %self.template.render(&self.vars(address, REDACTED)),
            "Querying geocoding provider"
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.error(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.error(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.error(format!("Read body failed: {}", e)))?;

        let parsed: GeocodeResponse = serde_json::from_str(&body)
            .map_err(|e| self.error(format!("Parse response failed: {}", e)))?;

        debug!(
            provider = %self.name,
            status = %parsed.status,
            results = parsed.results.len(),
            "Provider responded"
        );

        Ok(parsed)
    }
}
