// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use membridge_core::MembridgeError;
use membridge_pipeline::{IngestRequest, MemoryBridge};

use super::{parse_input, to_json};
use crate::tool::{Tool, ToolOutput};

/// Runs text through the gatekeeper, which decides whether to save, update, or drop it.
pub struct IngestMemoryTool {
    bridge: Arc<MemoryBridge>,
}

impl IngestMemoryTool {
    pub fn new(bridge: Arc<MemoryBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for IngestMemoryTool {
    fn name(&self) -> &str {
        "ingest_memory"
    }

    fn description(&self) -> &str {
        "Offer a piece of conversation to long-term memory. The gatekeeper saves new facts, updates related ones, and discards chatter."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": { "type": "string" },
                "context": { "type": "string", "description": "Known related memories; replaces retrieval when non-empty" },
                "force_save": { "type": "boolean", "default": false },
                "source": { "type": "string" },
                "source_url": { "type": "string" }
            },
            "required": ["text"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MembridgeError> {
        let request: IngestRequest = parse_input(self.name(), input)?;
        let outcome = self.bridge.ingest(request).await?;
        Ok(ToolOutput::ok(to_json(&outcome)?))
    }
}
