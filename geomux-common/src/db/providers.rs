//! Provider configuration repository
//!
//! CRUD over the `providers` table. Name lookups and uniqueness go through
//! the `name_key` column, which holds [`name_key`] of the display name.

use crate::models::{name_key, ProviderConfig, ProviderConfigInput, ProviderDescriptor};
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

const SELECT_COLUMNS: &str =
    "SELECT id, name, endpoint_template, api_key, priority, additional, created_at, updated_at FROM providers";

/// All provider configurations, best priority first
pub async fn list_providers(pool: &SqlitePool) -> Result<Vec<ProviderConfig>> {
    let rows = sqlx::query_as::<_, ProviderConfig>(&format!(
        "{} ORDER BY priority, name",
        SELECT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All usable provider configurations as factory descriptors
///
/// Rows whose `additional` column cannot be decoded are logged and left out.
pub async fn list_descriptors(pool: &SqlitePool) -> Result<Vec<ProviderDescriptor>> {
    let descriptors = list_providers(pool)
        .await?
        .iter()
        .filter_map(|config| match config.descriptor() {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!(provider = %config.name, error = %e, "Skipping undecodable provider configuration");
                None
            }
        })
        .collect();

    Ok(descriptors)
}

pub async fn get_provider(pool: &SqlitePool, id: i64) -> Result<Option<ProviderConfig>> {
    let row = sqlx::query_as::<_, ProviderConfig>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Case-insensitive lookup by provider name
pub async fn get_provider_by_name(pool: &SqlitePool, name: &str) -> Result<Option<ProviderConfig>> {
    let row = sqlx::query_as::<_, ProviderConfig>(&format!("{} WHERE name_key = ?", SELECT_COLUMNS))
        .bind(name_key(name))
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn create_provider(pool: &SqlitePool, input: &ProviderConfigInput) -> Result<ProviderConfig> {
    input.validate()?;

    let name = input.name.trim();
    if get_provider_by_name(pool, name).await?.is_some() {
        return Err(Error::Conflict(format!("Provider '{}' already exists", name)));
    }

    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO providers (name, name_key, endpoint_template, api_key, priority, additional, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(name_key(name))
    .bind(input.endpoint_template.trim())
    .bind(&input.api_key)
    .bind(input.priority)
    .bind(input.additional_json()?)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, name))?;

    let id = result.last_insert_rowid();
    info!(provider = %name, id, priority = input.priority, "Provider configuration created");

    get_provider(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Provider {} vanished after insert", id)))
}

pub async fn update_provider(
    pool: &SqlitePool,
    id: i64,
    input: &ProviderConfigInput,
) -> Result<ProviderConfig> {
    input.validate()?;

    if get_provider(pool, id).await?.is_none() {
        return Err(Error::NotFound(format!("Provider {}", id)));
    }

    let name = input.name.trim();
    if let Some(existing) = get_provider_by_name(pool, name).await? {
        if existing.id != id {
            return Err(Error::Conflict(format!("Provider '{}' already exists", name)));
        }
    }

    sqlx::query(
        r#"
        UPDATE providers
        SET name = ?, name_key = ?, endpoint_template = ?, api_key = ?, priority = ?, additional = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(name_key(name))
    .bind(input.endpoint_template.trim())
    .bind(&input.api_key)
    .bind(input.priority)
    .bind(input.additional_json()?)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, name))?;

    info!(provider = %name, id, priority = input.priority, "Provider configuration updated");

    get_provider(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Provider {}", id)))
}

/// Returns false when no row had the given id
pub async fn delete_provider(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM providers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        info!(id, "Provider configuration deleted");
    }
    Ok(deleted)
}

/// Insert descriptors whose name is not configured yet
///
/// Existing rows are never overwritten; invalid descriptors are skipped with a warning.
pub async fn seed_providers(pool: &SqlitePool, descriptors: &[ProviderDescriptor]) -> Result<usize> {
    let mut inserted = 0;

    for descriptor in descriptors {
        if get_provider_by_name(pool, &descriptor.name).await?.is_some() {
            debug!(provider = %descriptor.name, "Provider already configured, not seeding");
            continue;
        }

        match create_provider(pool, &ProviderConfigInput::from(descriptor.clone())).await {
            Ok(_) => inserted += 1,
            Err(Error::InvalidInput(msg)) => {
                warn!(provider = %descriptor.name, "Skipping invalid provider from config file: {}", msg);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(inserted)
}

fn map_unique_violation(err: sqlx::Error, name: &str) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::Conflict(format!("Provider '{}' already exists", name));
        }
    }
    Error::Database(err)
}
