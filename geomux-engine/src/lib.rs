//! geomux-engine library interface
//!
//! Geocoding provider aggregation and refinement orchestration, plus the
//! HTTP surface that exposes it.

pub mod aggregator;
pub mod api;
pub mod control;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod services;
pub mod types;

pub use crate::aggregator::Aggregator;
pub use crate::control::RequestControl;
pub use crate::error::{ApiError, ApiResult};
pub use crate::orchestrator::RefinementOrchestrator;

use crate::providers::{ConfiguredCatalog, ProviderCatalog, ProviderFactory, SqliteProviderStore};
use crate::services::{HttpAddressRefiner, HttpPlacesClient, ParameterResolver};
use crate::types::{AddressRefiner, ParameterStore, PlacesSearch};
use axum::Router;
use chrono::{DateTime, Utc};
use geomux_common::db::parameters::REQUEST_TIMEOUT_SECS;
use reqwest::Client;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Runtime parameter lookup (endpoints, keys, timeout)
    pub params: Arc<dyn ParameterStore>,
    pub aggregator: Aggregator,
    pub orchestrator: Arc<RefinementOrchestrator>,
    pub places: Arc<dyn PlacesSearch>,
    /// Cancelled on shutdown; every request control is a child of it
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Production wiring: SQLite-backed providers and parameters, HTTP collaborators
    ///
    /// `toml_parameters` is the `[parameters]` fallback table; `http` is shared
    /// by every provider and collaborator call.
    pub fn new(db: SqlitePool, toml_parameters: BTreeMap<String, String>, http: Client) -> Self {
        let params: Arc<dyn ParameterStore> =
            Arc::new(ParameterResolver::new(db.clone(), toml_parameters));
        let catalog = Arc::new(ConfiguredCatalog::new(
            Arc::new(SqliteProviderStore::new(db.clone())),
            ProviderFactory::new(http.clone()),
        ));
        let refiner = Arc::new(HttpAddressRefiner::new(http.clone(), params.clone()));
        let places = Arc::new(HttpPlacesClient::new(http, params.clone()));

        Self::from_parts(db, params, catalog, refiner, places)
    }

    /// Wiring with explicit components
    pub fn from_parts(
        db: SqlitePool,
        params: Arc<dyn ParameterStore>,
        catalog: Arc<dyn ProviderCatalog>,
        refiner: Arc<dyn AddressRefiner>,
        places: Arc<dyn PlacesSearch>,
    ) -> Self {
        let aggregator = Aggregator::new(catalog);
        let orchestrator = Arc::new(RefinementOrchestrator::new(
            refiner,
            aggregator.clone(),
            places.clone(),
        ));

        Self {
            db,
            params,
            aggregator,
            orchestrator,
            places,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
        }
    }

    /// Deadline from `request_timeout_secs`, cancelled on shutdown
    pub async fn request_control(&self) -> RequestControl {
        let timeout = self.params.get(REQUEST_TIMEOUT_SECS).await;
        RequestControl::from_timeout_secs(timeout.as_deref())
            .with_token(self.shutdown.child_token())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::geocode_routes())
        .merge(api::provider_routes())
        .merge(api::parameter_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
