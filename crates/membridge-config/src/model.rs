// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level membridge configuration.
///
/// Every section is optional and defaults to values that run a local bridge
/// backed by Gemini with verbatim content storage.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MembridgeConfig {
    /// Bridge identity and logging.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding backend settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retrieval thresholds and result counts.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Memory write behaviour.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Decision engine settings.
    #[serde(default)]
    pub gatekeeper: GatekeeperConfig,

    /// Hosted Gemini oracle settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Local Ollama oracle settings.
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Bridge identity and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Display name reported by the status endpoint.
    #[serde(default = "default_bridge_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            name: default_bridge_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bridge_name() -> String {
    "membridge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on API routes. `None` leaves the API open.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable SQLite WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("membridge").join("memories.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("memories.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Which embedder turns text into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX sentence-transformer model.
    Onnx,
    /// Deterministic feature hashing, no model download.
    Hashing,
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingBackend::Onnx => f.write_str("onnx"),
            EmbeddingBackend::Hashing => f.write_str("hashing"),
        }
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,

    /// Model name, used as the cache directory name.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Directory where downloaded models are cached.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Vector width. Must be 384 for the ONNX backend.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model_name: default_model_name(),
            data_dir: default_data_dir(),
            dimensions: default_dimensions(),
        }
    }
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Onnx
}

fn default_model_name() -> String {
    "paraphrase-multilingual-MiniLM-L12-v2".to_string()
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("membridge"))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .to_string_lossy()
        .into_owned()
}

fn default_dimensions() -> usize {
    384
}

/// Retrieval configuration.
///
/// Distances are squared L2 between unit vectors, so they range over `[0, 4]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Number of neighbours fetched as ingestion context.
    #[serde(default = "default_context_k")]
    pub context_k: usize,

    /// Default number of results for search.
    #[serde(default = "default_search_k")]
    pub search_k: usize,

    /// Strict cut-off: a match is kept only when `distance < threshold`.
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Optional upper bound of the low-confidence band.
    #[serde(default)]
    pub weak_threshold: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_k: default_context_k(),
            search_k: default_search_k(),
            threshold: default_threshold(),
            weak_threshold: None,
        }
    }
}

fn default_context_k() -> usize {
    3
}

fn default_search_k() -> usize {
    5
}

fn default_threshold() -> f32 {
    1.5
}

/// Memory write behaviour.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Append `[Source: .. | URL: ..]` to content saved by ingestion.
    #[serde(default)]
    pub source_footer: bool,
}

/// Which language model backs the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    Gemini,
    Ollama,
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleKind::Gemini => f.write_str("gemini"),
            OracleKind::Ollama => f.write_str("ollama"),
        }
    }
}

/// How the decision engine treats content on SAVE and UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentPolicy {
    /// Store exactly what the user wrote.
    Verbatim,
    /// Store the oracle's canonical rewrite.
    Summarize,
}

impl fmt::Display for ContentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentPolicy::Verbatim => f.write_str("verbatim"),
            ContentPolicy::Summarize => f.write_str("summarize"),
        }
    }
}

/// Decision engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatekeeperConfig {
    #[serde(default = "default_oracle")]
    pub oracle: OracleKind,

    #[serde(default = "default_content_policy")]
    pub content_policy: ContentPolicy,

    /// Sampling temperature sent to the oracle.
    #[serde(default)]
    pub temperature: f32,

    /// Upper bound on a single classification call.
    #[serde(default = "default_gatekeeper_timeout")]
    pub timeout_secs: u64,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            oracle: default_oracle(),
            content_policy: default_content_policy(),
            temperature: 0.0,
            timeout_secs: default_gatekeeper_timeout(),
        }
    }
}

fn default_oracle() -> OracleKind {
    OracleKind::Gemini
}

fn default_content_policy() -> ContentPolicy {
    ContentPolicy::Verbatim
}

fn default_gatekeeper_timeout() -> u64 {
    8
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Ollama configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5:1.5b".to_string()
}
