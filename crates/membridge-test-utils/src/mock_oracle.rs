// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted classifier oracle for deterministic testing.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use membridge_core::{
    AdapterType, ClassifierOracle, HealthStatus, MembridgeError, OracleRequest, OracleResponse,
    PluginAdapter,
};

/// Answer returned once the script runs out.
pub const DEFAULT_ANSWER: &str =
    r#"{"intent":"SAVE","reason":"mock default","content":"","tags":[]}"#;

/// A classifier oracle that replays pre-configured answers.
///
/// Answers are popped from a FIFO queue; when the queue is empty
/// [`DEFAULT_ANSWER`] is returned. Every request is recorded for assertions.
pub struct MockOracle {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<OracleRequest>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            failure: None,
            delay: None,
        }
    }

    /// Oracle pre-loaded with raw answer texts.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let oracle = Self::new();
        oracle
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(responses.into_iter().map(Into::into));
        oracle
    }

    /// Oracle whose every call fails with a transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Sleep before answering, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue one more answer.
    pub fn push_response(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(text.into());
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_response(&self) -> String {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| DEFAULT_ANSWER.to_string())
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockOracle {
    fn name(&self) -> &str {
        "mock-oracle"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, MembridgeError> {
        Ok(match &self.failure {
            Some(message) => HealthStatus::Degraded(message.clone()),
            None => HealthStatus::Healthy,
        })
    }

    async fn shutdown(&self) -> Result<(), MembridgeError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierOracle for MockOracle {
    async fn classify(&self, request: OracleRequest) -> Result<OracleResponse, MembridgeError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(MembridgeError::transport(message.clone(), None));
        }
        Ok(OracleResponse {
            text: self.next_response(),
            model: "mock-model".to_string(),
        })
    }
}
