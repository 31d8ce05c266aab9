// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval, decision, and dispatch for one ingested text.

use std::sync::Arc;

use membridge_core::MembridgeError;
use membridge_gatekeeper::{Decision, DecisionEngine, DecisionRequest, Intent, UNKNOWN_TARGET};
use membridge_memory::{
    normalize_source, MemoryStore, NewMemory, RetrievalEngine, RetrievalPolicy, DEFAULT_SOURCE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Text handed to the pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestRequest {
    pub text: String,
    /// Caller-supplied context; when non-empty it replaces retrieval.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub force_save: bool,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl IngestRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn force_save(mut self, force_save: bool) -> Self {
        self.force_save = force_save;
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn source(mut self, source: Option<String>, source_url: Option<String>) -> Self {
        self.source = source;
        self.source_url = source_url;
        self
    }
}

/// What the dispatch step did to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResult {
    Saved { id: String, message: String },
    Updated { id: String, message: String },
    Discarded { reason: String, message: String },
    /// A recoverable condition: the decision could not be applied.
    Skipped { reason: String, message: String },
}

impl ActionResult {
    fn saved(id: String) -> Self {
        let message = format!("saved memory {id}");
        ActionResult::Saved { id, message }
    }

    fn updated(id: String) -> Self {
        let message = format!("updated memory {id}");
        ActionResult::Updated { id, message }
    }

    fn discarded(reason: String) -> Self {
        let message = format!("discarded: {reason}");
        ActionResult::Discarded { reason, message }
    }

    fn skipped(reason: String) -> Self {
        let message = format!("skipped: {reason}");
        ActionResult::Skipped { reason, message }
    }

    pub fn message(&self) -> &str {
        match self {
            ActionResult::Saved { message, .. }
            | ActionResult::Updated { message, .. }
            | ActionResult::Discarded { message, .. }
            | ActionResult::Skipped { message, .. } => message,
        }
    }

    /// Id of the memory written, if any.
    pub fn memory_id(&self) -> Option<&str> {
        match self {
            ActionResult::Saved { id, .. } | ActionResult::Updated { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Full trace of one ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub decision: Decision,
    /// Whether the decision engine saw any context.
    pub context_provided: bool,
    pub action_result: ActionResult,
}

/// Pipeline settings taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub context_policy: RetrievalPolicy,
    /// Append a `[Source: .. | URL: ..]` line to saved content.
    pub source_footer: bool,
}

/// Retrieval, then decision, then store mutation.
pub struct IngestionPipeline {
    store: Arc<MemoryStore>,
    retrieval: RetrievalEngine,
    engine: Arc<DecisionEngine>,
    options: PipelineOptions,
}

impl IngestionPipeline {
    pub fn new(store: Arc<MemoryStore>, engine: Arc<DecisionEngine>, options: PipelineOptions) -> Self {
        Self {
            retrieval: RetrievalEngine::new(store.clone()),
            store,
            engine,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Ingest one text.
    ///
    /// Oracle failures never surface here (the engine falls back to a raw
    /// SAVE). Storage failures propagate and may be retried by the caller.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome, MembridgeError> {
        if request.text.trim().is_empty() {
            return Err(MembridgeError::Validation("text must not be empty".to_string()));
        }

        let context = match request.context.as_deref() {
            Some(ctx) if !ctx.trim().is_empty() => {
                debug!("using caller-supplied context");
                ctx.to_string()
            }
            _ => {
                self.retrieval
                    .retrieve(&request.text, self.options.context_policy)
                    .await?
                    .text
            }
        };
        let context_provided = !context.trim().is_empty();

        let decision = self
            .engine
            .decide(
                &DecisionRequest::new(request.text.clone(), context)
                    .force_save(request.force_save)
                    .source_url(request.source_url.clone()),
            )
            .await;

        let action_result = self.dispatch(&decision, &request).await?;
        info!(
            intent = %decision.intent,
            context_provided,
            action = action_result.message(),
            "ingest complete"
        );

        Ok(IngestOutcome {
            decision,
            context_provided,
            action_result,
        })
    }

    async fn dispatch(
        &self,
        decision: &Decision,
        request: &IngestRequest,
    ) -> Result<ActionResult, MembridgeError> {
        match decision.intent {
            Intent::Save => {
                // Provenance always comes from the request, never from the oracle.
                let content = if self.options.source_footer {
                    with_source_footer(
                        &decision.content,
                        request.source.as_deref(),
                        request.source_url.as_deref(),
                    )
                } else {
                    decision.content.clone()
                };
                let id = self
                    .store
                    .insert(
                        NewMemory::new(content)
                            .with_tags(decision.tags.iter().cloned())
                            .with_source(request.source.clone(), request.source_url.clone()),
                    )
                    .await?;
                Ok(ActionResult::saved(id))
            }
            Intent::Update => {
                let target = decision.target_id.as_deref().unwrap_or(UNKNOWN_TARGET);
                if target == UNKNOWN_TARGET {
                    warn!("update decision has no resolvable target, skipping");
                    return Ok(ActionResult::skipped(
                        "update target could not be resolved from context".to_string(),
                    ));
                }
                match self.store.update(target, &decision.content, None).await {
                    Ok(()) => Ok(ActionResult::updated(target.to_string())),
                    Err(MembridgeError::NotFound { id }) => {
                        warn!(id = %id, "update target vanished before dispatch, skipping");
                        Ok(ActionResult::skipped(format!("memory {id} no longer exists")))
                    }
                    Err(e) => Err(e),
                }
            }
            Intent::Discard => Ok(ActionResult::discarded(decision.reason.clone())),
        }
    }
}

/// Append the provenance footer when there is provenance to show.
fn with_source_footer(content: &str, source: Option<&str>, source_url: Option<&str>) -> String {
    let source = normalize_source(source);
    let url = source_url.map(str::trim).filter(|u| !u.is_empty());
    if source == DEFAULT_SOURCE && url.is_none() {
        return content.to_string();
    }
    format!(
        "{content}\n\n[Source: {source} | URL: {}]",
        url.unwrap_or("None")
    )
}
