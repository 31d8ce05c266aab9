// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: search, save, ingest, update, forget, config.

use colored::Colorize;
use membridge_config::MembridgeConfig;
use membridge_core::MembridgeError;
use membridge_memory::{Confidence, RetrievedMemory};
use membridge_pipeline::{ActionResult, AddMemory, IngestOutcome, IngestRequest};

use crate::setup::{init_tracing, open_bridge};

const REDACTED: &str = "[redacted]";

pub async fn search(
    config: &MembridgeConfig,
    query: &str,
    k: Option<usize>,
    threshold: Option<f32>,
) -> Result<(), MembridgeError> {
    init_tracing(config);
    let bridge = open_bridge(config, false).await?;
    let results = bridge.search_memory(query, threshold, k).await?;
    if results.is_empty() {
        println!("{}", "no matching memories".dimmed());
    }
    for memory in &results {
        println!("{}", format_memory(memory));
    }
    bridge.shutdown().await
}

pub async fn save(
    config: &MembridgeConfig,
    content: String,
    tags: Vec<String>,
    source: Option<String>,
    source_url: Option<String>,
) -> Result<(), MembridgeError> {
    init_tracing(config);
    let bridge = open_bridge(config, false).await?;
    let id = bridge
        .add_memory(AddMemory {
            content,
            tags,
            source,
            source_url,
        })
        .await?;
    println!("saved {}", id.bold());
    bridge.shutdown().await
}

pub async fn ingest(
    config: &MembridgeConfig,
    text: String,
    force_save: bool,
    context: Option<String>,
    source: Option<String>,
    source_url: Option<String>,
) -> Result<(), MembridgeError> {
    init_tracing(config);
    let bridge = open_bridge(config, true).await?;
    let outcome = bridge
        .ingest(IngestRequest {
            text,
            context,
            force_save,
            source,
            source_url,
        })
        .await?;
    println!("{}", format_outcome(&outcome));
    bridge.shutdown().await
}

pub async fn update(
    config: &MembridgeConfig,
    id: &str,
    content: &str,
    tags: Vec<String>,
) -> Result<(), MembridgeError> {
    init_tracing(config);
    let bridge = open_bridge(config, false).await?;
    let tags = (!tags.is_empty()).then_some(tags);
    bridge.update_memory(id, content, tags).await?;
    println!("updated {}", id.bold());
    bridge.shutdown().await
}

pub async fn forget(config: &MembridgeConfig, id: &str) -> Result<(), MembridgeError> {
    init_tracing(config);
    let bridge = open_bridge(config, false).await?;
    bridge.delete_memory(id).await?;
    println!("deleted {}", id.bold());
    bridge.shutdown().await
}

/// Print the resolved configuration with secrets masked.
pub fn print_config(config: &MembridgeConfig) -> Result<(), MembridgeError> {
    println!("{}", render_config(config)?);
    Ok(())
}

fn render_config(config: &MembridgeConfig) -> Result<String, MembridgeError> {
    let mut masked = config.clone();
    if masked.gemini.api_key.is_some() {
        masked.gemini.api_key = Some(REDACTED.to_string());
    }
    if masked.server.bearer_token.is_some() {
        masked.server.bearer_token = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&masked)
        .map_err(|e| MembridgeError::Internal(format!("failed to render config: {e}")))
}

/// `<id>  <distance>  <content>` with weak matches dimmed.
pub fn format_memory(memory: &RetrievedMemory) -> String {
    let line = format!("{}  {:.3}  {}", memory.id, memory.distance, memory.content);
    match memory.confidence {
        Confidence::Strong => line,
        Confidence::Weak => format!("{} {}", line.dimmed(), "(low confidence)".dimmed()),
    }
}

/// One-line summary of an ingestion.
pub fn format_outcome(outcome: &IngestOutcome) -> String {
    let label = match &outcome.action_result {
        ActionResult::Saved { .. } => "SAVE".green(),
        ActionResult::Updated { .. } => "UPDATE".cyan(),
        ActionResult::Discarded { .. } => "DISCARD".yellow(),
        ActionResult::Skipped { .. } => "SKIP".red(),
    };
    let mut line = format!("{label} {}", outcome.action_result.message());
    let writes = outcome.action_result.memory_id().is_some();
    if outcome.decision.is_fallback() {
        line.push_str(&format!(" {}", "(gatekeeper unavailable, saved raw)".dimmed()));
    } else if writes && !outcome.decision.reason.is_empty() {
        line.push_str(&format!(" {}", format!("- {}", outcome.decision.reason).dimmed()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_config_masks_secrets() {
        let mut config = MembridgeConfig::default();
        config.gemini.api_key = Some("AIza-very-secret".into());
        config.server.bearer_token = Some("tok".into());
        let rendered = render_config(&config).unwrap();
        assert!(!rendered.contains("AIza-very-secret"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("[retrieval]"));
    }

    #[tokio::test]
    async fn outcome_line_names_the_action() {
        colored::control::set_override(false);
        let h = membridge_test_utils::TestHarness::builder()
            .with_oracle_responses([r#"{"intent":"DISCARD","reason":"small talk"}"#])
            .build()
            .await
            .unwrap();
        let outcome = h.ingest("haha nice").await.unwrap();
        assert_eq!(
            format_outcome(&outcome),
            "DISCARD discarded: small talk"
        );
    }
}
