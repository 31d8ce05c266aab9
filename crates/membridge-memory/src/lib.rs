// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory storage and retrieval for membridge.
//!
//! ## Architecture
//!
//! - **MemoryStore**: SQLite persistence with BLOB vectors, exact nearest-neighbour query
//! - **RetrievalEngine**: distance-threshold filtering and context formatting
//! - **OnnxEmbedder**: local multilingual sentence-transformer inference
//! - **HashingEmbedder**: deterministic n-gram feature hashing, no model files
//! - **ModelManager**: first-run model download from HuggingFace
//! - **Types**: MemoryRecord, ScoredMemory, id and distance helpers

pub mod database;
pub mod embedder;
pub mod hashing;
pub mod migrations;
pub mod model_manager;
pub mod retriever;
pub mod store;
pub mod types;

pub use embedder::OnnxEmbedder;
pub use hashing::HashingEmbedder;
pub use model_manager::ModelManager;
pub use retriever::{
    extract_ids, Confidence, RetrievalEngine, RetrievalPolicy, RetrievedContext, RetrievedMemory,
};
pub use store::MemoryStore;
pub use types::*;
