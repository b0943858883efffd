//! Persisted models shared across geomux crates

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum provider name length
pub const MAX_PROVIDER_NAME_LEN: usize = 100;

/// Case-folded provider name used for uniqueness and lookups
///
/// Full Unicode lowercasing, so `Énergie` and `éNERGIE` collide.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Everything needed to build a callable provider handle
///
/// Names are unique case-insensitively. Lower `priority` is preferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub endpoint_template: String,
    pub api_key: String,
    pub priority: i32,
    /// Extra placeholder values for the endpoint template (substituted raw)
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// Provider configuration row (`providers` table)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderConfig {
    pub id: i64,
    pub name: String,
    pub endpoint_template: String,
    pub api_key: String,
    pub priority: i32,
    /// JSON object of extra placeholder values
    pub additional: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderConfig {
    /// Decode the `additional` column into placeholder values
    pub fn extra(&self) -> Result<BTreeMap<String, String>> {
        match self.additional.as_deref() {
            None => Ok(BTreeMap::new()),
            Some(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                Error::Internal(format!(
                    "Provider '{}' has malformed additional placeholders: {}",
                    self.name, e
                ))
            }),
        }
    }

    /// Convert the row into a descriptor for the provider factory
    pub fn descriptor(&self) -> Result<ProviderDescriptor> {
        Ok(ProviderDescriptor {
            name: self.name.clone(),
            endpoint_template: self.endpoint_template.clone(),
            api_key: self.api_key.clone(),
            priority: self.priority,
            extra: self.extra()?,
        })
    }
}

/// Create/update payload for a provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfigInput {
    pub name: String,
    pub endpoint_template: String,
    pub api_key: String,
    pub priority: i32,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl ProviderConfigInput {
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Provider name is required".to_string()));
        }
        if name.chars().count() > MAX_PROVIDER_NAME_LEN {
            return Err(Error::InvalidInput(format!(
                "Provider name must not exceed {} characters",
                MAX_PROVIDER_NAME_LEN
            )));
        }

        let endpoint = self.endpoint_template.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::InvalidInput(format!(
                "Endpoint template must be an http(s) URL: '{}'",
                self.endpoint_template
            )));
        }

        if self.api_key.trim().is_empty() {
            return Err(Error::InvalidInput("API key is required".to_string()));
        }

        Ok(())
    }

    /// Serialized form of `extra` for the `additional` column
    pub fn additional_json(&self) -> Result<Option<String>> {
        if self.extra.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(&self.extra)
            .map(Some)
            .map_err(|e| Error::Internal(format!("Serialize placeholders failed: {}", e)))
    }
}

impl From<ProviderDescriptor> for ProviderConfigInput {
    fn from(d: ProviderDescriptor) -> Self {
        Self {
            name: d.name,
            endpoint_template: d.endpoint_template,
            api_key: d.api_key,
            priority: d.priority,
            extra: d.extra,
        }
    }
}

/// Runtime parameter row (`parameters` table)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub updated_at: DateTime<Utc>,
}
