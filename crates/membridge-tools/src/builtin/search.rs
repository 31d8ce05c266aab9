// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use membridge_core::MembridgeError;
use membridge_pipeline::MemoryBridge;
use serde::Deserialize;

use super::{parse_input, to_json};
use crate::tool::{Tool, ToolOutput};

#[derive(Deserialize)]
struct SearchInput {
    query: String,
    #[serde(default)]
    threshold: Option<f32>,
    #[serde(default)]
    k: Option<usize>,
}

/// Semantic search over stored memories.
pub struct SearchMemoryTool {
    bridge: Arc<MemoryBridge>,
}

impl SearchMemoryTool {
    pub fn new(bridge: Arc<MemoryBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for SearchMemoryTool {
    fn name(&self) -> &str {
        "search_memory"
    }

    fn description(&self) -> &str {
        "Search long-term memory for facts related to a query. Returns matches ordered by distance (lower is closer)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to look for" },
                "threshold": {
                    "type": "number",
                    "description": "Maximum distance (exclusive) in (0, 4]; defaults to the configured threshold"
                },
                "k": { "type": "integer", "minimum": 1, "description": "Maximum number of results" }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MembridgeError> {
        let input: SearchInput = parse_input(self.name(), input)?;
        let results = self
            .bridge
            .search_memory(&input.query, input.threshold, input.k)
            .await?;
        if results.is_empty() {
            return Ok(ToolOutput::ok("No relevant memories found."));
        }
        Ok(ToolOutput::ok(to_json(&results)?))
    }
}
