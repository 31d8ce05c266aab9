// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The long-lived service object behind every transport.

use std::path::PathBuf;
use std::sync::Arc;

use membridge_config::{EmbeddingBackend, EmbeddingConfig, MembridgeConfig};
use membridge_core::{ClassifierOracle, EmbeddingAdapter, HealthStatus, MembridgeError};
use membridge_gatekeeper::{DecisionEngine, GatekeeperSettings};
use membridge_memory::{
    HashingEmbedder, MemoryRecord, MemoryStore, ModelManager, NewMemory, OnnxEmbedder,
    RetrievalEngine, RetrievalPolicy, RetrievedMemory,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ingest::{IngestOutcome, IngestRequest, IngestionPipeline, PipelineOptions};

/// Input to [`MemoryBridge::add_memory`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddMemory {
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl AddMemory {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Snapshot returned by [`MemoryBridge::health`].
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub name: String,
    /// `ok`, or `degraded: <detail>` when the oracle reports trouble.
    pub status: String,
    pub oracle: String,
    pub embedder: String,
    pub content_policy: String,
    pub count: usize,
}

/// Memory store, retrieval, and gatekeeper wired together once at startup.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct MemoryBridge {
    config: MembridgeConfig,
    store: Arc<MemoryStore>,
    retrieval: RetrievalEngine,
    pipeline: IngestionPipeline,
    oracle: Arc<dyn ClassifierOracle>,
}

impl MemoryBridge {
    /// Open the configured database and embedder, and wire in `oracle`.
    pub async fn open(
        config: &MembridgeConfig,
        oracle: Arc<dyn ClassifierOracle>,
    ) -> Result<Self, MembridgeError> {
        let embedder = build_embedder(&config.embedding).await?;
        let store = MemoryStore::open(
            &config.storage.database_path,
            config.storage.wal_mode,
            embedder,
        )
        .await?;
        info!(
            path = %config.storage.database_path,
            oracle = oracle.name(),
            "memory bridge opened"
        );
        Ok(Self::from_parts(config, Arc::new(store), oracle))
    }

    /// Wire an already opened store. Used by tests and embedding hosts.
    pub fn from_parts(
        config: &MembridgeConfig,
        store: Arc<MemoryStore>,
        oracle: Arc<dyn ClassifierOracle>,
    ) -> Self {
        let engine = Arc::new(DecisionEngine::new(
            oracle.clone(),
            GatekeeperSettings::from(&config.gatekeeper),
        ));
        let options = PipelineOptions {
            context_policy: RetrievalPolicy::context(&config.retrieval),
            source_footer: config.memory.source_footer,
        };
        Self {
            config: config.clone(),
            retrieval: RetrievalEngine::new(store.clone()),
            pipeline: IngestionPipeline::new(store.clone(), engine, options),
            store,
            oracle,
        }
    }

    pub fn config(&self) -> &MembridgeConfig {
        &self.config
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Store `content` as-is, bypassing the gatekeeper.
    pub async fn add_memory(&self, memory: AddMemory) -> Result<String, MembridgeError> {
        require_text("content", &memory.content)?;
        self.store
            .insert(
                NewMemory::new(memory.content)
                    .with_tags(memory.tags)
                    .with_source(memory.source, memory.source_url),
            )
            .await
    }

    /// Threshold-filtered nearest neighbours of `query`.
    pub async fn search_memory(
        &self,
        query: &str,
        threshold: Option<f32>,
        k: Option<usize>,
    ) -> Result<Vec<RetrievedMemory>, MembridgeError> {
        require_text("query", query)?;
        if let Some(t) = threshold.filter(|t| !(*t > 0.0 && *t <= 4.0)) {
            return Err(MembridgeError::Validation(format!(
                "threshold must be in (0, 4], got {t}"
            )));
        }
        if k == Some(0) {
            return Err(MembridgeError::Validation("k must be at least 1".to_string()));
        }
        self.retrieval
            .search(query, RetrievalPolicy::search(&self.config.retrieval, k, threshold))
            .await
    }

    pub async fn update_memory(
        &self,
        id: &str,
        new_content: &str,
        new_tags: Option<Vec<String>>,
    ) -> Result<(), MembridgeError> {
        require_text("memory_id", id)?;
        require_text("new_content", new_content)?;
        self.store.update(id, new_content, new_tags).await
    }

    pub async fn delete_memory(&self, id: &str) -> Result<(), MembridgeError> {
        require_text("memory_id", id)?;
        self.store.delete(id).await
    }

    /// Run text through retrieval, the gatekeeper, and dispatch.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome, MembridgeError> {
        self.pipeline.ingest(request).await
    }

    pub async fn count(&self) -> Result<usize, MembridgeError> {
        self.store.count().await
    }

    /// Most recently written records, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<MemoryRecord>, MembridgeError> {
        self.store.list_recent(limit).await
    }

    pub async fn health(&self) -> Result<BridgeStatus, MembridgeError> {
        let status = match self.oracle.health_check().await? {
            HealthStatus::Healthy => "ok".to_string(),
            HealthStatus::Degraded(detail) | HealthStatus::Unhealthy(detail) => {
                format!("degraded: {detail}")
            }
        };
        Ok(BridgeStatus {
            name: self.config.bridge.name.clone(),
            status,
            oracle: self.oracle.name().to_string(),
            embedder: self.store.embedder_name().to_string(),
            content_policy: self.config.gatekeeper.content_policy.to_string(),
            count: self.store.count().await?,
        })
    }

    /// Checkpoint the database and release the oracle.
    pub async fn shutdown(&self) -> Result<(), MembridgeError> {
        self.oracle.shutdown().await?;
        self.store.close().await?;
        info!("memory bridge shut down");
        Ok(())
    }
}

/// Build the embedder selected by `embedding.backend`.
///
/// The ONNX backend downloads its model on first use.
pub async fn build_embedder(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingAdapter>, MembridgeError> {
    match config.backend {
        EmbeddingBackend::Onnx => {
            let manager = ModelManager::new(PathBuf::from(&config.data_dir), &config.model_name);
            let model_path = manager.ensure_model().await?;
            let embedder = OnnxEmbedder::new(&model_path)?;
            Ok(Arc::new(embedder))
        }
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimensions))),
    }
}

fn require_text(field: &str, value: &str) -> Result<(), MembridgeError> {
    if value.trim().is_empty() {
        return Err(MembridgeError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
