//! AI address refinement client
//!
//! Sends the address to a completion endpoint and returns the corrected text.
//! Endpoint, key and model come from the parameter store, so the stage is
//! skipped (by the orchestrator) until an operator configures them.
//!
//! # API
//! - `POST <ai_endpoint>` with `Authorization: Bearer <ai_api_key>`
//! - Body: `{"model", "prompt": "Refine this address: <address>", "max_tokens": 100}`
//! - Reply: `{"choices": [{"text": "..."}]}`

use crate::types::{AddressRefiner, GeocodeError, ParameterStore};
use async_trait::async_trait;
use geomux_common::db::parameters::{AI_API_KEY, AI_ENDPOINT, AI_MODEL};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const SERVICE: &str = "AI refinement";
const DEFAULT_MODEL: &str = "default-model";
const MAX_TOKENS: u32 = 100;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: Option<String>,
}

pub struct HttpAddressRefiner {
    http: Client,
    params: Arc<dyn ParameterStore>,
}

impl HttpAddressRefiner {
    pub fn new(http: Client, params: Arc<dyn ParameterStore>) -> Self {
        Self { http, params }
    }
}

fn error(message: impl Into<String>) -> GeocodeError {
    GeocodeError::Collaborator {
        service: SERVICE.to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl AddressRefiner for HttpAddressRefiner {
    async fn refine(&self, address: &str) -> Result<String, GeocodeError> {
        let endpoint = self.params.require(AI_ENDPOINT).await?;
        let api_key = self.params.require(AI_API_KEY).await?;
        let model = self
            .params
            .get(AI_MODEL)
            .await
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let request = CompletionRequest {
            model: &model,
            prompt: format!("Refine this address: {}", address),
            max_tokens: MAX_TOKENS,
        };

        debug!(endpoint = %endpoint, model = %model, "Requesting address refinement");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| error(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error(format!("HTTP {}", status)));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| error(format!("Parse response failed: {}", e)))?;

        let choice = body
            .choices
            .and_then(|choices| choices.into_iter().next())
            .ok_or_else(|| error("Response has no choices"))?;

        match choice.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Ok(address.to_string()),
        }
    }
}
