//! Parameter repository
//!
//! Name/value runtime parameters consumed by the AI refinement and places
//! collaborators. Defaults are seeded only when absent.

use crate::models::Parameter;
use crate::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

/// Completion endpoint for address refinement
pub const AI_ENDPOINT: &str = "ai_endpoint";
/// Bearer token for the completion endpoint
pub const AI_API_KEY: &str = "ai_api_key";
/// Model name sent with refinement requests
pub const AI_MODEL: &str = "ai_model";
/// Nearby search endpoint
pub const PLACES_ENDPOINT: &str = "places_endpoint";
/// Place details endpoint
pub const PLACES_DETAILS_ENDPOINT: &str = "places_details_endpoint";
/// Key for both places endpoints
pub const PLACES_API_KEY: &str = "places_api_key";
/// Per-request deadline in seconds (0 disables)
pub const REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";

/// Seeded defaults: (name, value, description, category)
///
/// Keys and the AI endpoint are deliberately absent: without them the
/// corresponding pipeline stage is skipped.
pub const DEFAULT_PARAMETERS: &[(&str, &str, &str, &str)] = &[
    (
        AI_MODEL,
        "default-model",
        "Model name sent to the address refinement endpoint",
        "ai",
    ),
    (
        PLACES_ENDPOINT,
        "https://maps.googleapis.com/maps/api/place/nearbysearch/json",
        "Nearby places search endpoint",
        "places",
    ),
    (
        PLACES_DETAILS_ENDPOINT,
        "https://maps.googleapis.com/maps/api/place/details/json",
        "Place details endpoint",
        "places",
    ),
    (
        REQUEST_TIMEOUT_SECS,
        "30",
        "Deadline in seconds for a single geocode request (0 disables)",
        "system",
    ),
];

/// Parameter names are case-insensitive and stored lowercase
fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

pub async fn get_parameter(pool: &SqlitePool, name: &str) -> Result<Option<Parameter>> {
    let row = sqlx::query_as::<_, Parameter>(
        "SELECT name, value, description, category, updated_at FROM parameters WHERE name = ?",
    )
    .bind(normalize(name))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Value only, `None` when the parameter is not stored
pub async fn get_parameter_value(pool: &SqlitePool, name: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM parameters WHERE name = ?")
        .bind(normalize(name))
        .fetch_optional(pool)
        .await?;

    Ok(value)
}

pub async fn list_parameters(pool: &SqlitePool) -> Result<Vec<Parameter>> {
    let rows = sqlx::query_as::<_, Parameter>(
        "SELECT name, value, description, category, updated_at FROM parameters ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert or update a parameter
///
/// `None` description/category keep the stored values.
pub async fn set_parameter(
    pool: &SqlitePool,
    name: &str,
    value: &str,
    description: Option<&str>,
    category: Option<&str>,
) -> Result<Parameter> {
    let name = normalize(name);
    sqlx::query(
        r#"
        INSERT INTO parameters (name, value, description, category, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            value = excluded.value,
            description = COALESCE(excluded.description, parameters.description),
            category = COALESCE(excluded.category, parameters.category),
            updated_at = excluded.updated_at
        "#,
    )
    .bind(name.as_str())
    .bind(value)
    .bind(description)
    .bind(category)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    info!(parameter = %name, "Parameter saved");

    get_parameter(pool, &name)
        .await?
        .ok_or_else(|| crate::Error::Internal(format!("Parameter '{}' vanished after upsert", name)))
}

/// Returns false when the parameter did not exist
pub async fn delete_parameter(pool: &SqlitePool, name: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM parameters WHERE name = ?")
        .bind(normalize(name))
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert missing defaults; returns how many rows were added
pub async fn seed_default_parameters(pool: &SqlitePool) -> Result<usize> {
    let mut inserted = 0;

    for &(name, value, description, category) in DEFAULT_PARAMETERS {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO parameters (name, value, description, category, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(value)
        .bind(description)
        .bind(category)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        inserted += result.rows_affected() as usize;
    }

    Ok(inserted)
}
