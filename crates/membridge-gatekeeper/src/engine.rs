// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The decision engine.

use std::sync::Arc;
use std::time::Duration;

use membridge_config::model::GatekeeperConfig;
use membridge_config::ContentPolicy;
use membridge_core::{ClassifierOracle, MembridgeError, OracleRequest};
use membridge_memory::extract_ids;
use tracing::{debug, info, warn};

use crate::decision::{Decision, Intent, UNKNOWN_TARGET};
use crate::parse::{parse_classification, Classification};
use crate::prompt::{build_prompt, SYSTEM_INSTRUCTION};

/// Tuning knobs for [`DecisionEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatekeeperSettings {
    pub content_policy: ContentPolicy,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for GatekeeperSettings {
    fn default() -> Self {
        Self::from(&GatekeeperConfig::default())
    }
}

impl From<&GatekeeperConfig> for GatekeeperSettings {
    fn from(config: &GatekeeperConfig) -> Self {
        Self {
            content_policy: config.content_policy,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// One input to classify.
#[derive(Debug, Clone, Default)]
pub struct DecisionRequest {
    pub input: String,
    /// Retrieved context in `[ID: <id>] <content>` lines; may be empty.
    pub context: String,
    pub force_save: bool,
    pub source_url: Option<String>,
}

impl DecisionRequest {
    pub fn new(input: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            context: context.into(),
            ..Default::default()
        }
    }

    pub fn force_save(mut self, force_save: bool) -> Self {
        self.force_save = force_save;
        self
    }

    pub fn source_url(mut self, source_url: Option<String>) -> Self {
        self.source_url = source_url;
        self
    }
}

/// Classifies input as SAVE, UPDATE, or DISCARD.
///
/// `decide` never fails: oracle errors, timeouts, and unparseable answers all
/// become a raw-fallback SAVE of the untouched input.
pub struct DecisionEngine {
    oracle: Arc<dyn ClassifierOracle>,
    settings: GatekeeperSettings,
}

impl DecisionEngine {
    pub fn new(oracle: Arc<dyn ClassifierOracle>, settings: GatekeeperSettings) -> Self {
        Self { oracle, settings }
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    pub fn settings(&self) -> &GatekeeperSettings {
        &self.settings
    }

    /// Classify one input against its retrieved context.
    pub async fn decide(&self, request: &DecisionRequest) -> Decision {
        let decision = match self.classify(request).await {
            Ok(classification) => self.apply_policy(request, classification),
            Err(e) => {
                warn!(error = %e, oracle = self.oracle.name(), "gatekeeper falling back to raw save");
                metrics::counter!("membridge_gatekeeper_fallbacks_total").increment(1);
                Decision::raw_fallback(&request.input, format!("gatekeeper fallback: {e}"))
            }
        };

        metrics::counter!(
            "membridge_gatekeeper_decisions_total",
            "intent" => decision.intent.to_string()
        )
        .increment(1);
        info!(
            intent = %decision.intent,
            force_save = request.force_save,
            target_id = decision.target_id.as_deref().unwrap_or("-"),
            "gatekeeper decision"
        );
        decision
    }

    async fn classify(&self, request: &DecisionRequest) -> Result<Classification, MembridgeError> {
        let oracle_request = OracleRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(
                &request.input,
                &request.context,
                request.force_save,
                request.source_url.as_deref(),
                self.settings.content_policy,
            ),
            temperature: self.settings.temperature,
            json_output: true,
        };

        let response = tokio::time::timeout(
            self.settings.timeout,
            self.oracle.classify(oracle_request),
        )
        .await
        .map_err(|_| MembridgeError::Timeout {
            duration: self.settings.timeout,
        })??;

        debug!(model = %response.model, chars = response.text.len(), "oracle responded");
        parse_classification(&response.text)
    }

    fn apply_policy(&self, request: &DecisionRequest, c: Classification) -> Decision {
        let input = &request.input;

        if request.force_save {
            return Decision {
                intent: Intent::Save,
                reason: non_empty_or(c.reason, "forced save"),
                content: input.clone(),
                tags: clean_tags(c.tags),
                target_id: None,
            };
        }

        let content = match (c.intent, self.settings.content_policy) {
            (Intent::Discard, _) => String::new(),
            (_, ContentPolicy::Verbatim) => input.clone(),
            (_, ContentPolicy::Summarize) => {
                if c.content.trim().is_empty() {
                    input.clone()
                } else {
                    c.content
                }
            }
        };

        let target_id = (c.intent == Intent::Update)
            .then(|| resolve_target(c.target_id.as_deref(), &request.context));

        Decision {
            intent: c.intent,
            reason: c.reason,
            content,
            tags: clean_tags(c.tags),
            target_id,
        }
    }
}

/// Pick the memory an UPDATE refers to.
///
/// The oracle's choice wins if it names an id present in the context; else the
/// first id in the context; else [`UNKNOWN_TARGET`].
fn resolve_target(proposed: Option<&str>, context: &str) -> String {
    let ids = extract_ids(context);
    if let Some(proposed) = proposed {
        let proposed = proposed.trim_start_matches("[ID: ").trim_end_matches(']').trim();
        if ids.iter().any(|id| id == proposed) {
            return proposed.to_string();
        }
    }
    ids.into_iter()
        .next()
        .unwrap_or_else(|| UNKNOWN_TARGET.to_string())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn non_empty_or(s: String, default: &str) -> String {
    if s.trim().is_empty() {
        default.to_string()
    } else {
        s
    }
}
