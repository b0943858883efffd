//! Provider configuration API handlers
//!
//! CRUD over the `providers` table. Changes apply to the next geocode
//! request without a restart. API keys are write-only: responses only say
//! whether one is set.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use geomux_common::db::providers;
use geomux_common::{ProviderConfig, ProviderConfigInput};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Provider configuration as returned by the API
#[derive(Debug, Serialize)]
pub struct ProviderResponse {
    pub id: i64,
    pub name: String,
    pub endpoint_template: String,
    pub priority: i32,
    pub extra: BTreeMap<String, String>,
    pub api_key_set: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProviderConfig> for ProviderResponse {
    type Error = ApiError;

    fn try_from(config: ProviderConfig) -> Result<Self, Self::Error> {
        let extra = config.extra()?;
        Ok(Self {
            id: config.id,
            api_key_set: !config.api_key.trim().is_empty(),
            name: config.name,
            endpoint_template: config.endpoint_template,
            priority: config.priority,
            extra,
            created_at: config.created_at,
            updated_at: config.updated_at,
        })
    }
}

/// GET /api/providers
pub async fn list_providers(State(state): State<AppState>) -> ApiResult<Json<Vec<ProviderResponse>>> {
    let configs = providers::list_providers(&state.db).await?;
    let response = configs
        .into_iter()
        .map(ProviderResponse::try_from)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(response))
}

/// GET /api/providers/:id
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProviderResponse>> {
    let config = providers::get_provider(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Provider {}", id)))?;
    Ok(Json(config.try_into()?))
}

/// POST /api/providers
pub async fn create_provider(
    State(state): State<AppState>,
    Json(input): Json<ProviderConfigInput>,
) -> ApiResult<(StatusCode, Json<ProviderResponse>)> {
    info!(provider = %input.name, priority = input.priority, "Create provider");
    let config = providers::create_provider(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(config.try_into()?)))
}

/// PUT /api/providers/:id
pub async fn update_provider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ProviderConfigInput>,
) -> ApiResult<Json<ProviderResponse>> {
    info!(id, provider = %input.name, priority = input.priority, "Update provider");
    let config = providers::update_provider(&state.db, id, &input).await?;
    Ok(Json(config.try_into()?))
}

/// DELETE /api/providers/:id
pub async fn delete_provider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if providers::delete_provider(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Provider {}", id)))
    }
}

/// Build provider configuration routes
pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/api/providers", get(list_providers).post(create_provider))
        .route(
            "/api/providers/:id",
            get(get_provider).put(update_provider).delete(delete_provider),
        )
}
