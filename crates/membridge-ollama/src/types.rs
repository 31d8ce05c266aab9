// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama `/api/generate` wire types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
}

/// Body of `POST /api/generate` with streaming disabled.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub system: String,
    pub stream: bool,
    /// `"json"` constrains the model to emit a JSON object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Error body returned by Ollama on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
