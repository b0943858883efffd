//! Runtime parameter resolution
//!
//! **Priority:** Database → Environment (`GEOMUX_<NAME>`) → TOML `[parameters]`
//!
//! Blank values count as absent at every tier. A parameter defined in more
//! than one tier is logged as a potential misconfiguration.

use crate::types::ParameterStore;
use async_trait::async_trait;
use geomux_common::db::parameters;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Environment variable consulted for parameter `name`
pub fn env_var_name(name: &str) -> String {
    format!("GEOMUX_{}", name.to_uppercase())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct ParameterResolver {
    db: SqlitePool,
    toml: BTreeMap<String, String>,
}

impl ParameterResolver {
    /// `toml` holds the `[parameters]` table of the bootstrap config
    pub fn new(db: SqlitePool, toml: BTreeMap<String, String>) -> Self {
        Self { db, toml }
    }
}

#[async_trait]
impl ParameterStore for ParameterResolver {
    async fn get(&self, name: &str) -> Option<String> {
        let db_value = match parameters::get_parameter_value(&self.db, name).await {
            Ok(value) => non_blank(value),
            Err(e) => {
                warn!(parameter = %name, error = %e, "Parameter lookup in database failed");
                None
            }
        };
        let env_value = non_blank(std::env::var(env_var_name(name)).ok());
        let toml_value = non_blank(self.toml.get(name).cloned());

        let sources: Vec<&str> = [
            db_value.as_ref().map(|_| "database"),
            env_value.as_ref().map(|_| "environment"),
            toml_value.as_ref().map(|_| "TOML"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if sources.len() > 1 {
            warn!(
                parameter = %name,
                "Parameter found in multiple sources: {}. Using {} (highest priority).",
                sources.join(", "),
                sources[0]
            );
        }
        if let Some(source) = sources.first() {
            debug!(parameter = %name, source, "Parameter resolved");
        }

        db_value.or(env_value).or(toml_value)
    }
}
