// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic feature-hashing embedder.
//!
//! Maps character 1-3 grams of the lowercased text into a fixed number of
//! buckets with FNV-1a, then L2-normalizes. No model files, no network, and
//! stable across runs and platforms. Lexical overlap stands in for semantic
//! similarity, which is enough for tests and offline deployments.

use async_trait::async_trait;

use membridge_core::error::MembridgeError;
use membridge_core::traits::adapter::PluginAdapter;
use membridge_core::traits::EmbeddingAdapter;
use membridge_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

use crate::types::l2_normalize;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const MAX_GRAM: usize = 3;

/// Character n-gram hashing embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Creates an embedder producing vectors of `dimensions` width (minimum 1).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed one string.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        let mut buckets = vec![0.0f32; self.dimensions];

        for n in 1..=MAX_GRAM {
            if chars.len() < n {
                break;
            }
            // Longer grams carry more signal than single characters.
            let weight = n as f32;
            for gram in chars.windows(n) {
                if gram.iter().all(|c| c.is_whitespace()) {
                    continue;
                }
                let hash = fnv1a(gram);
                let index = (hash % self.dimensions as u64) as usize;
                let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
                buckets[index] += sign * weight;
            }
        }

        l2_normalize(&buckets)
    }
}

fn fnv1a(gram: &[char]) -> u64 {
    let mut hash = FNV_OFFSET;
    let mut buf = [0u8; 4];
    for c in gram {
        for byte in c.encode_utf8(&mut buf).as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

#[async_trait]
impl PluginAdapter for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MembridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MembridgeError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for HashingEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MembridgeError> {
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.embed_text(t)).collect(),
            dimensions: self.dimensions,
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
