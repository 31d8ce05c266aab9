// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Oracle,
    Storage,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Texts to embed, in order.
    pub texts: Vec<String>,
}

impl EmbeddingInput {
    /// Convenience constructor for a single text.
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            texts: vec![text.into()],
        }
    }
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// One vector per input text, same order as the input.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimensionality of every vector.
    pub dimensions: usize,
}

/// A single classification request sent to a language-model oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    /// System-level instruction describing the task.
    pub system_instruction: String,
    /// The user-facing prompt with input and context.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Ask the backend to constrain output to a JSON object.
    pub json_output: bool,
}

/// Raw text returned by a language-model oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleResponse {
    pub text: String,
    pub model: String,
}
