// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local Ollama classifier oracle.
//!
//! Lets the gatekeeper run fully offline against a small local model.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use membridge_config::OllamaConfig;
use membridge_core::{
    AdapterType, ClassifierOracle, HealthStatus, MembridgeError, OracleRequest, OracleResponse,
    PluginAdapter,
};
use tracing::info;

use crate::client::OllamaClient;
use crate::types::{GenerateOptions, GenerateRequest};

/// Ollama-backed [`ClassifierOracle`].
pub struct OllamaOracle {
    client: OllamaClient,
    model: String,
}

impl OllamaOracle {
    pub fn new(config: &OllamaConfig) -> Result<Self, MembridgeError> {
        let client = OllamaClient::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(model = %config.model, base_url = %config.base_url, "Ollama oracle initialized");
        Ok(Self {
            client,
            model: config.model.clone(),
        })
    }

    fn to_generate_request(&self, request: OracleRequest) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: request.prompt,
            system: request.system_instruction,
            stream: false,
            format: request.json_output.then(|| "json".to_string()),
            options: GenerateOptions {
                temperature: request.temperature,
            },
        }
    }
}

#[async_trait]
impl PluginAdapter for OllamaOracle {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, MembridgeError> {
        Ok(match self.client.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Degraded(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), MembridgeError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierOracle for OllamaOracle {
    async fn classify(&self, request: OracleRequest) -> Result<OracleResponse, MembridgeError> {
        let response = self.client.generate(&self.to_generate_request(request)).await?;
        if response.response.trim().is_empty() {
            return Err(MembridgeError::Oracle {
                message: "Ollama returned an empty response".to_string(),
            });
        }
        let model = if response.model.is_empty() {
            self.model.clone()
        } else {
            response.model
        };
        Ok(OracleResponse {
            text: response.response,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oracle(base_url: &str) -> OllamaOracle {
        OllamaOracle::new(&OllamaConfig {
            base_url: base_url.to_string(),
            ..OllamaConfig::default()
        })
        .unwrap()
    }

    fn oracle_request() -> OracleRequest {
        OracleRequest {
            system_instruction: "sys".into(),
            prompt: "User input: likes jazz".into(),
            temperature: 0.0,
            json_output: true,
        }
    }

    #[tokio::test]
    async fn classify_sends_json_format_without_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "qwen2.5:1.5b",
                "system": "sys",
                "stream": false,
                "format": "json"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "qwen2.5:1.5b",
                "response": "{\"intent\":\"DISCARD\"}",
                "done": true
            })))
            .mount(&server)
            .await;

        let resp = oracle(&server.uri()).classify(oracle_request()).await.unwrap();
        assert_eq!(resp.text, r#"{"intent":"DISCARD"}"#);
        assert_eq!(resp.model, "qwen2.5:1.5b");
    }

    #[tokio::test]
    async fn missing_model_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model 'qwen2.5:1.5b' not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = oracle(&server.uri()).classify(oracle_request()).await.unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {err}");
    }

    #[tokio::test]
    async fn empty_response_is_oracle_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "", "done": true})),
            )
            .mount(&server)
            .await;

        let err = oracle(&server.uri()).classify(oracle_request()).await.unwrap_err();
        assert!(matches!(err, MembridgeError::Oracle { .. }));
    }

    #[tokio::test]
    async fn health_reflects_reachability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;
        assert_eq!(oracle(&server.uri()).health_check().await.unwrap(), HealthStatus::Healthy);

        let unreachable = oracle("http://127.0.0.1:9");
        assert!(matches!(
            unreachable.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }
}
