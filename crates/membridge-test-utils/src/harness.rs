// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete [`MemoryBridge`] with a [`MockOracle`],
//! a temp SQLite database, and the hashing embedder.

use std::sync::Arc;

use membridge_config::{ContentPolicy, EmbeddingBackend, MembridgeConfig};
use membridge_core::MembridgeError;
use membridge_memory::{HashingEmbedder, MemoryStore};
use membridge_pipeline::{IngestOutcome, IngestRequest, MemoryBridge};

use crate::mock_oracle::MockOracle;

/// Embedding width used by the harness.
pub const HARNESS_DIMENSIONS: usize = 256;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    failure: Option<String>,
    config: MembridgeConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = MembridgeConfig::default();
        config.embedding.backend = EmbeddingBackend::Hashing;
        config.embedding.dimensions = HARNESS_DIMENSIONS;
        Self {
            responses: Vec::new(),
            failure: None,
            config,
        }
    }

    /// Script the oracle's answers.
    pub fn with_oracle_responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    /// Make every oracle call fail.
    pub fn with_failing_oracle(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn with_content_policy(mut self, policy: ContentPolicy) -> Self {
        self.config.gatekeeper.content_policy = policy;
        self
    }

    pub fn with_source_footer(mut self, enabled: bool) -> Self {
        self.config.memory.source_footer = enabled;
        self
    }

    pub fn with_weak_threshold(mut self, weak_threshold: f32) -> Self {
        self.config.retrieval.weak_threshold = Some(weak_threshold);
        self
    }

    /// Build the harness over a fresh temp database.
    pub async fn build(self) -> Result<TestHarness, MembridgeError> {
        let temp_dir = tempfile::TempDir::new().map_err(MembridgeError::storage)?;
        let db_path = temp_dir.path().join("memories.db");

        let mut config = self.config;
        config.storage.database_path = db_path.to_string_lossy().to_string();

        let store = MemoryStore::open(
            &config.storage.database_path,
            config.storage.wal_mode,
            Arc::new(HashingEmbedder::new(config.embedding.dimensions)),
        )
        .await?;

        let oracle = Arc::new(match self.failure {
            Some(message) => MockOracle::failing(message),
            None => MockOracle::with_responses(self.responses),
        });
        tracing::debug!(path = %config.storage.database_path, "test harness database ready");
        let bridge = Arc::new(MemoryBridge::from_parts(
            &config,
            Arc::new(store),
            oracle.clone(),
        ));

        Ok(TestHarness {
            bridge,
            oracle,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete bridge over temp storage with a scripted oracle.
pub struct TestHarness {
    pub bridge: Arc<MemoryBridge>,
    /// The scripted oracle, for queueing answers and inspecting prompts.
    pub oracle: Arc<MockOracle>,
    pub config: MembridgeConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings and an unscripted oracle.
    pub async fn new() -> Result<Self, MembridgeError> {
        Self::builder().build().await
    }

    /// Ingest `text` with no overrides.
    pub async fn ingest(&self, text: &str) -> Result<IngestOutcome, MembridgeError> {
        self.bridge.ingest(IngestRequest::new(text)).await
    }
}
