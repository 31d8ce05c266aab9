// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Direct store mutations that bypass the gatekeeper.

use std::sync::Arc;

use async_trait::async_trait;
use membridge_core::MembridgeError;
use membridge_pipeline::{AddMemory, MemoryBridge};
use serde::Deserialize;

use super::parse_input;
use crate::tool::{Tool, ToolOutput};

/// Saves content verbatim.
pub struct SaveMemoryTool {
    bridge: Arc<MemoryBridge>,
}

impl SaveMemoryTool {
    pub fn new(bridge: Arc<MemoryBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for SaveMemoryTool {
    fn name(&self) -> &str {
        "save_memory"
    }

    fn description(&self) -> &str {
        "Store a fact in long-term memory exactly as given, without filtering."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "source": { "type": "string", "description": "Platform the fact came from" },
                "source_url": { "type": "string" }
            },
            "required": ["content"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MembridgeError> {
        let memory: AddMemory = parse_input(self.name(), input)?;
        let id = self.bridge.add_memory(memory).await?;
        Ok(ToolOutput::ok(format!("Saved memory {id}")))
    }
}

#[derive(Deserialize)]
struct UpdateInput {
    memory_id: String,
    new_content: String,
    #[serde(default)]
    new_tags: Option<Vec<String>>,
}

/// Replaces the content of an existing memory.
pub struct UpdateMemoryTool {
    bridge: Arc<MemoryBridge>,
}

impl UpdateMemoryTool {
    pub fn new(bridge: Arc<MemoryBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for UpdateMemoryTool {
    fn name(&self) -> &str {
        "update_memory"
    }

    fn description(&self) -> &str {
        "Replace the content of a stored memory by id. Omitting new_tags keeps the existing tags."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "memory_id": { "type": "string" },
                "new_content": { "type": "string" },
                "new_tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["memory_id", "new_content"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MembridgeError> {
        let input: UpdateInput = parse_input(self.name(), input)?;
        self.bridge
            .update_memory(&input.memory_id, &input.new_content, input.new_tags)
            .await?;
        Ok(ToolOutput::ok(format!("Updated memory {}", input.memory_id)))
    }
}

#[derive(Deserialize)]
struct DeleteInput {
    memory_id: String,
}

/// Removes a memory permanently.
pub struct DeleteMemoryTool {
    bridge: Arc<MemoryBridge>,
}

impl DeleteMemoryTool {
    pub fn new(bridge: Arc<MemoryBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for DeleteMemoryTool {
    fn name(&self) -> &str {
        "delete_memory"
    }

    fn description(&self) -> &str {
        "Permanently delete a stored memory by id."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "memory_id": { "type": "string" } },
            "required": ["memory_id"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MembridgeError> {
        let input: DeleteInput = parse_input(self.name(), input)?;
        self.bridge.delete_memory(&input.memory_id).await?;
        Ok(ToolOutput::ok(format!("Deleted memory {}", input.memory_id)))
    }
}
