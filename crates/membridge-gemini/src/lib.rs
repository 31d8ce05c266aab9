// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini classifier oracle.
//!
//! Implements [`ClassifierOracle`] over the Gemini `generateContent` API with
//! JSON response mode, which is what the gatekeeper's decision schema needs.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use membridge_config::GeminiConfig;
use membridge_core::{
    AdapterType, ClassifierOracle, HealthStatus, MembridgeError, OracleRequest, OracleResponse,
    PluginAdapter,
};
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig};

/// Environment variable consulted when `gemini.api_key` is unset.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini-backed [`ClassifierOracle`].
///
/// API key resolution order: config -> `GEMINI_API_KEY` env var -> error.
pub struct GeminiOracle {
    client: GeminiClient,
}

impl GeminiOracle {
    pub fn new(config: &GeminiConfig) -> Result<Self, MembridgeError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = GeminiClient::new(
            &api_key,
            &config.base_url,
            &config.model,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(model = %config.model, "Gemini oracle initialized");
        Ok(Self { client })
    }

    fn to_generate_request(request: &OracleRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content::text(None, request.system_instruction.clone()),
            contents: vec![Content::text(Some("user"), request.prompt.clone())],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: request
                    .json_output
                    .then(|| "application/json".to_string()),
            },
        }
    }
}

#[async_trait]
impl PluginAdapter for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, MembridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MembridgeError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierOracle for GeminiOracle {
    async fn classify(&self, request: OracleRequest) -> Result<OracleResponse, MembridgeError> {
        let response = self
            .client
            .generate(&Self::to_generate_request(&request))
            .await?;

        let Some(text) = response.first_text() else {
            let detail = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .or_else(|| response.candidates.first().and_then(|c| c.finish_reason.clone()))
                .unwrap_or_else(|| "empty response".to_string());
            return Err(MembridgeError::Oracle {
                message: format!("Gemini returned no text ({detail})"),
            });
        };

        debug!(chars = text.len(), "Gemini classification received");
        Ok(OracleResponse {
            text,
            model: response
                .model_version
                .unwrap_or_else(|| self.client.model().to_string()),
        })
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, MembridgeError> {
    if let Some(key) = config_key
        && !key.trim().is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            MembridgeError::Config(format!(
                "Gemini API key not found. Set gemini.api_key in config or {API_KEY_ENV} environment variable."
            ))
        })
}
