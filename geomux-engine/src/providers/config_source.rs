//! Provider configuration sources
//!
//! `SqliteProviderStore` reads the `providers` table on each call.
//! `StaticProviderConfigs` holds descriptors in memory (embedding, tests).

use crate::types::{GeocodeError, ProviderConfigSource};
use async_trait::async_trait;
use geomux_common::db::providers;
use geomux_common::ProviderDescriptor;
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use super::canonical_name;

/// Provider configurations persisted in SQLite
#[derive(Debug, Clone)]
pub struct SqliteProviderStore {
    db: SqlitePool,
}

impl SqliteProviderStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn source_error(e: geomux_common::Error) -> GeocodeError {
    GeocodeError::ConfigSource(e.to_string())
}

#[async_trait]
impl ProviderConfigSource for SqliteProviderStore {
    async fn list_provider_configs(&self) -> Result<Vec<ProviderDescriptor>, GeocodeError> {
        providers::list_descriptors(&self.db).await.map_err(source_error)
    }

    async fn get_provider_config(
        &self,
        name: &str,
    ) -> Result<Option<ProviderDescriptor>, GeocodeError> {
        match providers::get_provider_by_name(&self.db, name)
            .await
            .map_err(source_error)?
        {
            Some(config) => config.descriptor().map(Some).map_err(source_error),
            None => Ok(None),
        }
    }
}

/// In-memory descriptors, replaceable at runtime
#[derive(Debug, Default)]
pub struct StaticProviderConfigs {
    configs: RwLock<Vec<ProviderDescriptor>>,
}

impl StaticProviderConfigs {
    pub fn new(configs: Vec<ProviderDescriptor>) -> Self {
        Self {
            configs: RwLock::new(configs),
        }
    }

    pub async fn replace(&self, configs: Vec<ProviderDescriptor>) {
        *self.configs.write().await = configs;
    }
}

#[async_trait]
impl ProviderConfigSource for StaticProviderConfigs {
    async fn list_provider_configs(&self) -> Result<Vec<ProviderDescriptor>, GeocodeError> {
        Ok(self.configs.read().await.clone())
    }

    async fn get_provider_config(
        &self,
        name: &str,
    ) -> Result<Option<ProviderDescriptor>, GeocodeError> {
        let wanted = canonical_name(name);
        Ok(self
            .configs
            .read()
            .await
            .iter()
            .find(|d| canonical_name(&d.name) == wanted)
            .cloned())
    }
}
