//! Test helper utilities
//!
//! Shared utilities for geomux-engine integration tests: an in-memory app,
//! a local upstream stub server and request helpers.

#![allow(dead_code)]

pub mod upstream;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use geomux_common::db::{init_memory_database, parameters, providers};
use geomux_common::ProviderConfigInput;
use geomux_engine::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tower::util::ServiceExt;

pub use upstream::spawn_upstream;

/// App over an in-memory database with production wiring
pub async fn create_test_app() -> (Router, SqlitePool) {
    let pool = init_memory_database()
        .await
        .expect("Failed to create in-memory database");

    let state = AppState::new(pool.clone(), BTreeMap::new(), reqwest::Client::new());
    (build_router(state), pool)
}

/// Provider row pointing at `<base>/<path>?address={address}&key={apiKey}`
pub async fn add_provider(pool: &SqlitePool, name: &str, priority: i32, base: &str, path: &str) {
    providers::create_provider(
        pool,
        &ProviderConfigInput {
            name: name.to_string(),
            endpoint_template: format!("{}/{}?address={{address}}&key={{apiKey}}", base, path),
            api_key: format!("{}-key", name.to_lowercase()),
            priority,
            extra: BTreeMap::new(),
        },
    )
    .await
    .expect("Failed to create provider");
}

pub async fn set_param(pool: &SqlitePool, name: &str, value: &str) {
    parameters::set_parameter(pool, name, value, None, None)
        .await
        .expect("Failed to set parameter");
}

/// Send a request and decode the JSON body (`Value::Null` when empty)
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, json)
}
