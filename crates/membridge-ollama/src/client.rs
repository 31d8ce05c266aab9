// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local Ollama server.

use std::time::Duration;

use membridge_core::MembridgeError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateRequest, GenerateResponse};

/// Thin client over `/api/generate` and `/api/tags`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MembridgeError> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            MembridgeError::transport(format!("failed to build HTTP client: {e}"), Some(Box::new(e)))
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Run one non-streaming generation.
    ///
    /// Retries once on 500/503, which Ollama returns while a model is loading.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, MembridgeError> {
        let url = format!("{}/api/generate", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying Ollama request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self.client.post(&url).json(request).send().await.map_err(|e| {
                MembridgeError::transport(
                    format!("cannot reach Ollama at {}: {e}", self.base_url),
                    Some(Box::new(e)),
                )
            })?;

            let status = response.status();
            debug!(status = %status, attempt, model = %request.model, "Ollama response received");

            if status.is_success() {
                return response.json::<GenerateResponse>().await.map_err(|e| {
                    MembridgeError::Oracle {
                        message: format!("failed to parse Ollama response: {e}"),
                    }
                });
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("Ollama error ({status}): {}", api_err.error),
                Err(_) => format!("Ollama returned {status}: {body}"),
            };
            if matches!(status.as_u16(), 500 | 503) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(MembridgeError::transport(message, None));
                continue;
            }
            return Err(MembridgeError::transport(message, None));
        }

        Err(last_error.unwrap_or_else(|| {
            MembridgeError::transport("Ollama request failed after retries", None)
        }))
    }

    /// Whether the server answers `GET /api/tags`.
    pub async fn ping(&self) -> Result<(), MembridgeError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            MembridgeError::transport(format!("cannot reach Ollama: {e}"), Some(Box::new(e)))
        })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(MembridgeError::transport(
                format!("Ollama returned {}", response.status()),
                None,
            ))
        }
    }
}
