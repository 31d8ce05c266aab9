// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use membridge_core::MembridgeError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text or JSON returned by the tool.
    pub content: String,
    /// Whether the invocation failed.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// A named operation callable with JSON input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in definitions.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the input object.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MembridgeError>;
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool under its `name()`, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// (name, description) pairs sorted by name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    /// Tool definitions sorted by name.
    ///
    /// Each definition has the shape:
    /// ```json
    /// { "name": "search_memory", "description": "...", "input_schema": { ... } }
    /// ```
    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "input_schema": t.parameters_schema(),
                })
            })
            .collect()
    }

    /// Invoke `name`, folding tool failures into an error output.
    ///
    /// Returns `None` only when no tool has that name.
    pub async fn invoke(&self, name: &str, input: serde_json::Value) -> Option<ToolOutput> {
        let tool = self.get(name)?;
        Some(match tool.invoke(input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = name, error = %e, "tool invocation failed");
                ToolOutput::error(e.to_string())
            }
        })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input back"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"]
            })
        }

        async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MembridgeError> {
            input["message"]
                .as_str()
                .map(ToolOutput::ok)
                .ok_or_else(|| MembridgeError::Validation("missing 'message'".into()))
        }
    }

    struct NoopTool;

    #[async_trait]
    impl Tool for NoopTool {
        fn name(&self) -> &str {
            "noop"
        }

        fn description(&self) -> &str {
            "Does nothing"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": {} })
        }

        async fn invoke(&self, _input: serde_json::Value) -> Result<ToolOutput, MembridgeError> {
            Ok(ToolOutput::ok(""))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NoopTool));
        registry.register(Arc::new(EchoTool));
        registry
    }

    #[test]
    fn definitions_are_sorted_and_complete() {
        let defs = registry().tool_definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0]["name"], "echo");
        assert_eq!(defs[1]["name"], "noop");
        assert_eq!(defs[0]["input_schema"]["required"][0], "message");
    }

    #[test]
    fn list_returns_name_description_pairs() {
        assert_eq!(
            registry().list(),
            vec![("echo", "Echoes the input back"), ("noop", "Does nothing")]
        );
    }

    #[tokio::test]
    async fn invoke_folds_errors_into_output() {
        let registry = registry();
        let ok = registry
            .invoke("echo", serde_json::json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(ok, ToolOutput::ok("hi"));

        let err = registry.invoke("echo", serde_json::json!({})).await.unwrap();
        assert!(err.is_error);
        assert!(err.content.contains("missing 'message'"));

        assert!(registry.invoke("nope", serde_json::json!({})).await.is_none());
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }
}
