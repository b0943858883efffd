//! Parameter management API handlers
//!
//! GET /api/parameters, GET/PUT /api/parameters/:name

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use geomux_common::db::parameters;
use geomux_common::Parameter;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// PUT /api/parameters/:name request
///
/// Omitted description/category keep their stored values.
#[derive(Debug, Deserialize)]
pub struct UpdateParameterRequest {
    pub value: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// GET /api/parameters
pub async fn list_parameters(State(state): State<AppState>) -> ApiResult<Json<Vec<Parameter>>> {
    Ok(Json(parameters::list_parameters(&state.db).await?))
}

/// GET /api/parameters/:name
pub async fn get_parameter(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Parameter>> {
    parameters::get_parameter(&state.db, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Parameter '{}'", name)))
}

/// PUT /api/parameters/:name
pub async fn put_parameter(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<UpdateParameterRequest>,
) -> ApiResult<Json<Parameter>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Parameter name is required".to_string()));
    }
    tracing::info!(parameter = %name, "Update parameter");

    let saved = parameters::set_parameter(
        &state.db,
        name,
        &request.value,
        request.description.as_deref(),
        request.category.as_deref(),
    )
    .await?;

    Ok(Json(saved))
}

/// Build parameter management routes
pub fn parameter_routes() -> Router<AppState> {
    Router::new()
        .route("/api/parameters", get(list_parameters))
        .route("/api/parameters/:name", get(get_parameter).put(put_parameter))
}
