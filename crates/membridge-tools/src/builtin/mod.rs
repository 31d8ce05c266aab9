// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory tools, one per bridge operation.

pub mod ingest;
pub mod search;
pub mod write;

pub use ingest::IngestMemoryTool;
pub use search::SearchMemoryTool;
pub use write::{DeleteMemoryTool, SaveMemoryTool, UpdateMemoryTool};

use std::sync::Arc;

use membridge_core::MembridgeError;
use membridge_pipeline::MemoryBridge;
use serde::de::DeserializeOwned;

use crate::ToolRegistry;

/// Registers the five memory tools, all sharing `bridge`.
pub fn register_memory_tools(registry: &mut ToolRegistry, bridge: Arc<MemoryBridge>) {
    registry.register(Arc::new(SearchMemoryTool::new(bridge.clone())));
    registry.register(Arc::new(SaveMemoryTool::new(bridge.clone())));
    registry.register(Arc::new(UpdateMemoryTool::new(bridge.clone())));
    registry.register(Arc::new(DeleteMemoryTool::new(bridge.clone())));
    registry.register(Arc::new(IngestMemoryTool::new(bridge)));
}

/// Deserialize a tool's JSON input into its typed form.
fn parse_input<T: DeserializeOwned>(tool: &str, input: serde_json::Value) -> Result<T, MembridgeError> {
    serde_json::from_value(input)
        .map_err(|e| MembridgeError::Validation(format!("invalid input for {tool}: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, MembridgeError> {
    serde_json::to_string(value).map_err(|e| MembridgeError::Internal(format!("failed to encode tool output: {e}")))
}
