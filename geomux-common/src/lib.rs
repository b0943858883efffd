//! # Geomux Common Library
//!
//! Shared code for the geomux service crates:
//! - Bootstrap configuration loading (TOML, root folder resolution)
//! - SQLite schema and initialization
//! - Provider configuration and parameter repositories
//! - Persisted models

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{name_key, Parameter, ProviderConfig, ProviderConfigInput, ProviderDescriptor};
