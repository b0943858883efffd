//! Geocoding API handlers
//!
//! - `GET /api/geocode/process?address&mode&priorities&provider`
//! - `GET /api/geocode/process-refined?address&radius`
//! - `GET /api/geocode/place-details?place_id`
//!
//! Every request runs under the `request_timeout_secs` deadline and is
//! cancelled on shutdown.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::types::{AggregationOutcome, GeocodeMode, PlaceDetails, RefinementContext};
use crate::AppState;

/// Priority group used when `mode=group` comes without `priorities`
pub const DEFAULT_PRIORITY: i32 = 1;

#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    #[serde(default)]
    pub address: String,
    pub mode: Option<String>,
    /// Comma separated, e.g. `1,2`
    pub priorities: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefinedQuery {
    #[serde(default)]
    pub address: String,
    /// Meters; absent, 0 or less skips the places search
    pub radius: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceDetailsQuery {
    #[serde(default)]
    pub place_id: String,
}

/// Parse a comma separated priority list
///
/// Absent or blank means `{1}`; unparsable entries are dropped.
pub fn parse_priorities(raw: Option<&str>) -> BTreeSet<i32> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => BTreeSet::from([DEFAULT_PRIORITY]),
        Some(list) => list
            .split(',')
            .filter_map(|p| p.trim().parse::<i32>().ok())
            .collect(),
    }
}

/// Parse the `radius` query value; absent or blank means 0
pub fn parse_radius(raw: Option<&str>) -> ApiResult<i32> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(0),
        Some(value) => value.parse::<i32>().map_err(|_| {
            ApiError::BadRequest(format!("radius must be an integer number of meters, got '{}'", value))
        }),
    }
}

/// Map query parameters onto a selection mode
pub fn parse_mode(query: &ProcessQuery) -> ApiResult<GeocodeMode> {
    let mode = query
        .mode
        .as_deref()
        .map(|m| m.trim().to_lowercase())
        .unwrap_or_default();

    match mode.as_str() {
        "" | "first" => Ok(GeocodeMode::First),
        "all" => Ok(GeocodeMode::All),
        "group" => Ok(GeocodeMode::Group(parse_priorities(query.priorities.as_deref()))),
        "provider" => match query.provider.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(GeocodeMode::Provider(name.to_string())),
            _ => Err(ApiError::BadRequest(
                "provider is required when mode=provider".to_string(),
            )),
        },
        other => Err(ApiError::BadRequest(format!(
            "Unknown mode '{}' (expected first, all, group or provider)",
            other
        ))),
    }
}

/// GET /api/geocode/process
pub async fn process(
    State(state): State<AppState>,
    Query(query): Query<ProcessQuery>,
) -> ApiResult<Json<AggregationOutcome>> {
    let mode = parse_mode(&query)?;
    info!(address = %query.address, ?mode, "Geocode request");

    let control = state.request_control().await;
    let outcome = control
        .run(state.aggregator.run(&mode, &query.address))
        .await?;

    Ok(Json(outcome))
}

/// GET /api/geocode/process-refined
pub async fn process_refined(
    State(state): State<AppState>,
    Query(query): Query<RefinedQuery>,
) -> ApiResult<Json<RefinementContext>> {
    let radius = parse_radius(query.radius.as_deref())?;
    info!(address = %query.address, radius, "Refined geocode request");

    let control = state.request_control().await;
    let ctx = state
        .orchestrator
        .refine_and_geocode(&query.address, radius, &control)
        .await?;

    Ok(Json(ctx))
}

/// GET /api/geocode/place-details
pub async fn place_details(
    State(state): State<AppState>,
    Query(query): Query<PlaceDetailsQuery>,
) -> ApiResult<Json<PlaceDetails>> {
    info!(place_id = %query.place_id, "Place details request");

    let control = state.request_control().await;
    let details = control
        .run(state.places.place_details(&query.place_id))
        .await?;

    Ok(Json(details))
}

/// Build geocoding routes
pub fn geocode_routes() -> Router<AppState> {
    Router::new()
        .route("/api/geocode/process", get(process))
        .route("/api/geocode/process-refined", get(process_refined))
        .route("/api/geocode/place-details", get(place_details))
}
