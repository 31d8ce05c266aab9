// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::MembridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Adapter for turning text into vectors.
///
/// Implementations must be deterministic: identical text with the same model
/// version yields the identical vector. Output vectors are L2-normalized.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    /// Generates embeddings for the given input.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MembridgeError>;

    /// Dimensionality of the vectors this adapter produces.
    fn dimensions(&self) -> usize;
}
