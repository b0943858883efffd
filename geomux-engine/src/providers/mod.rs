//! Provider construction and catalogs
//!
//! Providers are data, not code: every descriptor maps to one
//! `HttpGeocodingProvider` through `ProviderFactory`. A `ProviderCatalog`
//! decides where descriptors come from and when they are (re)read.
//!
//! # Catalogs
//! - **ConfiguredCatalog** (default): re-reads the configuration source on
//!   every call, so providers added or removed at runtime take effect on the
//!   next request.
//! - **StaticCatalog**: fixed handle list injected at construction.

pub mod config_source;
pub mod http_provider;
pub mod template;

pub use config_source::{SqliteProviderStore, StaticProviderConfigs};
pub use http_provider::HttpGeocodingProvider;

use crate::types::{GeocodeError, GeocodingProvider, ProviderConfigSource};
use async_trait::async_trait;
use geomux_common::ProviderDescriptor;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Canonical form used for case-insensitive provider name matching
///
/// Same folding as the repository's `name_key` column.
pub fn canonical_name(name: &str) -> String {
    geomux_common::name_key(name)
}

/// Builds provider handles from descriptors
///
/// Pure mapping: no provider-specific code, no registration.
#[derive(Debug, Clone)]
pub struct ProviderFactory {
    http: Client,
}

impl ProviderFactory {
    /// `http` is shared by every handle this factory builds
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// One handle per descriptor; empty input yields an empty list
    pub fn build_all(&self, configs: &[ProviderDescriptor]) -> Vec<Arc<dyn GeocodingProvider>> {
        configs.iter().map(|d| self.handle(d.clone())).collect()
    }

    /// Handle for the descriptor named `name` (case-insensitive)
    pub fn build(
        &self,
        configs: &[ProviderDescriptor],
        name: &str,
    ) -> Result<Arc<dyn GeocodingProvider>, GeocodeError> {
        let index: HashMap<String, &ProviderDescriptor> = configs
            .iter()
            .map(|d| (canonical_name(&d.name), d))
            .collect();

        index
            .get(&canonical_name(name))
            .map(|d| self.handle((*d).clone()))
            .ok_or_else(|| GeocodeError::ProviderNotFound(name.to_string()))
    }

    fn handle(&self, descriptor: ProviderDescriptor) -> Arc<dyn GeocodingProvider> {
        Arc::new(HttpGeocodingProvider::new(descriptor, self.http.clone()))
    }
}

/// Where the aggregator gets its providers from
#[async_trait]
pub trait ProviderCatalog: Send + Sync {
    /// Every currently configured provider
    async fn providers(&self) -> Result<Vec<Arc<dyn GeocodingProvider>>, GeocodeError>;

    /// One provider by case-insensitive name, `ProviderNotFound` if absent
    async fn provider(&self, name: &str) -> Result<Arc<dyn GeocodingProvider>, GeocodeError>;
}

/// Rebuilds handles from the configuration source on every call
pub struct ConfiguredCatalog {
    source: Arc<dyn ProviderConfigSource>,
    factory: ProviderFactory,
}

impl ConfiguredCatalog {
    pub fn new(source: Arc<dyn ProviderConfigSource>, factory: ProviderFactory) -> Self {
        Self { source, factory }
    }
}

#[async_trait]
impl ProviderCatalog for ConfiguredCatalog {
    async fn providers(&self) -> Result<Vec<Arc<dyn GeocodingProvider>>, GeocodeError> {
        let configs = self.source.list_provider_configs().await?;
        debug!(count = configs.len(), "Loaded provider configurations");
        Ok(self.factory.build_all(&configs))
    }

    async fn provider(&self, name: &str) -> Result<Arc<dyn GeocodingProvider>, GeocodeError> {
        match self.source.get_provider_config(name).await? {
            Some(descriptor) => self.factory.build(std::slice::from_ref(&descriptor), &descriptor.name),
            None => Err(GeocodeError::ProviderNotFound(name.to_string())),
        }
    }
}

/// Fixed provider list
pub struct StaticCatalog {
    providers: Vec<Arc<dyn GeocodingProvider>>,
}

impl StaticCatalog {
    pub fn new(providers: Vec<Arc<dyn GeocodingProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl ProviderCatalog for StaticCatalog {
    async fn providers(&self) -> Result<Vec<Arc<dyn GeocodingProvider>>, GeocodeError> {
        Ok(self.providers.clone())
    }

    async fn provider(&self, name: &str) -> Result<Arc<dyn GeocodingProvider>, GeocodeError> {
        let wanted = canonical_name(name);
        self.providers
            .iter()
            .find(|p| canonical_name(p.name()) == wanted)
            .cloned()
            .ok_or_else(|| GeocodeError::ProviderNotFound(name.to_string()))
    }
}

#[cfg(test)]
pub mod mock {
    //! Scripted providers for aggregator and orchestrator tests

    use super::*;
    use crate::types::{GeocodeResponse, GeocodeResult, Geometry, LatLng, STATUS_OK};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub enum Behavior {
        Succeed(GeocodeResponse),
        Fail(String),
    }

    pub struct MockProvider {
        pub name: String,
        pub priority: i32,
        pub delay: Duration,
        pub behavior: Behavior,
        pub calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn ok(name: &str, priority: i32, delay_ms: u64, response: GeocodeResponse) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                priority,
                delay: Duration::from_millis(delay_ms),
                behavior: Behavior::Succeed(response),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing(name: &str, priority: i32, delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                priority,
                delay: Duration::from_millis(delay_ms),
                behavior: Behavior::Fail(format!("{} is down", name)),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeocodingProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn geocode(&self, _address: &str) -> Result<GeocodeResponse, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.behavior {
                Behavior::Succeed(response) => Ok(response.clone()),
                Behavior::Fail(message) => Err(GeocodeError::Provider {
                    provider: self.name.clone(),
                    message: message.clone(),
                }),
            }
        }
    }

    /// `OK` response with one result at (lat, lng), tagged by `label`
    pub fn ok_response(label: &str, lat: f64, lng: f64) -> GeocodeResponse {
        GeocodeResponse {
            status: STATUS_OK.to_string(),
            results: vec![GeocodeResult {
                formatted_address: label.to_string(),
                geometry: Some(Geometry {
                    location: Some(LatLng { lat, lng }),
                }),
                ..Default::default()
            }],
        }
    }

    pub fn catalog(providers: &[Arc<MockProvider>]) -> Arc<StaticCatalog> {
        Arc::new(StaticCatalog::new(
            providers
                .iter()
                .map(|p| Arc::clone(p) as Arc<dyn GeocodingProvider>)
                .collect(),
        ))
    }
}
