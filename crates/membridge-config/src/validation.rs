// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: positive thresholds,
//! ordering between the strict and weak thresholds, non-empty paths, and so on.

use crate::diagnostic::ConfigError;
use crate::model::{EmbeddingBackend, MembridgeConfig};

/// Largest squared L2 distance between two unit vectors.
const MAX_DISTANCE: f32 = 4.0;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &MembridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.bridge.log_level.as_str()) {
        fail(format!(
            "bridge.log_level `{}` must be one of: {}",
            config.bridge.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.server.port == 0 {
        fail("server.port must be non-zero".to_string());
    }

    if let Some(token) = &config.server.bearer_token
        && token.trim().is_empty()
    {
        fail("server.bearer_token must not be blank when set".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.embedding.dimensions == 0 {
        fail("embedding.dimensions must be greater than zero".to_string());
    }
    if config.embedding.backend == EmbeddingBackend::Onnx && config.embedding.dimensions != 384 {
        fail(format!(
            "embedding.dimensions must be 384 for the onnx backend, got {}",
            config.embedding.dimensions
        ));
    }
    if config.embedding.model_name.trim().is_empty() {
        fail("embedding.model_name must not be empty".to_string());
    }

    let retrieval = &config.retrieval;
    if !(retrieval.threshold > 0.0 && retrieval.threshold <= MAX_DISTANCE) {
        fail(format!(
            "retrieval.threshold must be in (0, {MAX_DISTANCE}], got {}",
            retrieval.threshold
        ));
    }
    if let Some(weak) = retrieval.weak_threshold
        && !(weak > retrieval.threshold && weak <= MAX_DISTANCE)
    {
        fail(format!(
            "retrieval.weak_threshold must be greater than retrieval.threshold ({}) and at most {MAX_DISTANCE}, got {weak}",
            retrieval.threshold
        ));
    }
    if retrieval.context_k == 0 {
        fail("retrieval.context_k must be at least 1".to_string());
    }
    if retrieval.search_k == 0 {
        fail("retrieval.search_k must be at least 1".to_string());
    }

    let temperature = config.gatekeeper.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        fail(format!(
            "gatekeeper.temperature must be within [0, 2], got {temperature}"
        ));
    }
    if config.gatekeeper.timeout_secs == 0 {
        fail("gatekeeper.timeout_secs must be at least 1".to_string());
    }

    for (key, url) in [
        ("gemini.base_url", &config.gemini.base_url),
        ("ollama.base_url", &config.ollama.base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            fail(format!("{key} `{url}` must start with http:// or https://"));
        }
    }
    for (key, secs) in [
        ("gemini.request_timeout_secs", config.gemini.request_timeout_secs),
        ("ollama.request_timeout_secs", config.ollama.request_timeout_secs),
    ] {
        if secs == 0 {
            fail(format!("{key} must be at least 1"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&MembridgeConfig::default()).is_ok());
    }

    #[test]
    fn weak_threshold_must_exceed_threshold() {
        let mut config = MembridgeConfig::default();
        config.retrieval.weak_threshold = Some(1.0);
        let errors = validate_config(&config).expect_err("should fail");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("weak_threshold"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = MembridgeConfig::default();
        config.retrieval.threshold = 0.0;
        config.retrieval.context_k = 0;
        config.gatekeeper.temperature = 3.0;
        config.server.port = 0;
        let errors = validate_config(&config).expect_err("should fail");
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn hashing_backend_allows_other_dimensions() {
        let mut config = MembridgeConfig::default();
        config.embedding.backend = EmbeddingBackend::Hashing;
        config.embedding.dimensions = 256;
        assert!(validate_config(&config).is_ok());

        config.embedding.backend = EmbeddingBackend::Onnx;
        assert!(validate_config(&config).is_err());
    }
}
