// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! Provides [`GeminiClient`] which handles request construction,
//! authentication, and transient error retry.

use std::time::Duration;

use membridge_core::MembridgeError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// HTTP client for Gemini API communication.
///
/// Retries once on transient statuses (429, 500, 503).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, MembridgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key).map_err(|e| {
                MembridgeError::Config(format!("invalid Gemini API key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                MembridgeError::transport(format!("failed to build HTTP client: {e}"), Some(Box::new(e)))
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{model}:generateContent",
                base_url.trim_end_matches('/')
            ),
            model: model.to_string(),
            max_retries: 1,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one `generateContent` call.
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, MembridgeError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying Gemini request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    MembridgeError::transport(format!("HTTP request failed: {e}"), Some(Box::new(e)))
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model = %self.model, "Gemini response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| {
                    MembridgeError::transport(
                        format!("failed to read response body: {e}"),
                        Some(Box::new(e)),
                    )
                })?;
                return serde_json::from_str(&body).map_err(|e| MembridgeError::Oracle {
                    message: format!("failed to parse Gemini response: {e}"),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(MembridgeError::transport(
                    format!("Gemini returned {status}: {body}"),
                    None,
                ));
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gemini API error ({}): {}",
                    api_err.error.status, api_err.error.message
                ),
                Err(_) => format!("Gemini returned {status}: {body}"),
            };
            return Err(MembridgeError::transport(message, None));
        }

        Err(last_error.unwrap_or_else(|| {
            MembridgeError::transport("Gemini request failed after retries", None)
        }))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, GenerationConfig};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new("test-key", base_url, "gemini-2.0-flash", Duration::from_secs(5)).unwrap()
    }

    fn test_request() -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content::text(None, "classify"),
            contents: vec![Content::text(Some("user"), "User input: hi")],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: Some("application/json".into()),
            },
        }
    }

    fn answer(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}],
            "modelVersion": "gemini-2.0-flash-001"
        })
    }

    #[tokio::test]
    async fn generate_success_sends_key_and_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("{}")))
            .mount(&server)
            .await;

        let resp = test_client(&server.uri()).generate(&test_request()).await.unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("{}"));
        assert_eq!(resp.model_version.as_deref(), Some("gemini-2.0-flash-001"));
    }

    #[tokio::test]
    async fn generate_retries_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("after retry")))
            .mount(&server)
            .await;

        let resp = test_client(&server.uri()).generate(&test_request()).await.unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("after retry"));
    }

    #[tokio::test]
    async fn generate_exhausts_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).generate(&test_request()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("overloaded"), "got: {err}");
    }

    #[tokio::test]
    async fn generate_surfaces_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).generate(&test_request()).await.unwrap_err();
        assert!(err.to_string().contains("INVALID_ARGUMENT"), "got: {err}");
    }
}
