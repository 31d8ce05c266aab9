// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Distance-threshold retrieval and context formatting.
//!
//! Wraps [`MemoryStore::query`] with a strict `distance < threshold` filter,
//! an optional low-confidence band, and the `[ID: <id>] <content>` context
//! format the decision engine reads back.

use std::sync::{Arc, LazyLock};

use membridge_config::model::RetrievalConfig;
use membridge_core::error::MembridgeError;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::store::MemoryStore;
use crate::types::{MemoryMetadata, MemoryRecord};

/// Context id marker opening a line, e.g. `[ID: 3f9a...]`.
static ID_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[ID: ([0-9a-f]+)\]").expect("id marker regex is valid"));

/// How many neighbours to fetch and which distances count as matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalPolicy {
    pub k: usize,
    /// A match is strong only when `distance < threshold`.
    pub threshold: f32,
    /// When set, `threshold <= distance < weak_threshold` is kept as a weak match.
    pub weak_threshold: Option<f32>,
}

impl RetrievalPolicy {
    pub fn new(k: usize, threshold: f32) -> Self {
        Self {
            k,
            threshold,
            weak_threshold: None,
        }
    }

    pub fn with_weak_threshold(mut self, weak_threshold: Option<f32>) -> Self {
        self.weak_threshold = weak_threshold;
        self
    }

    /// Policy used to build ingestion context.
    pub fn context(config: &RetrievalConfig) -> Self {
        Self::new(config.context_k, config.threshold).with_weak_threshold(config.weak_threshold)
    }

    /// Policy used by search, with optional caller overrides.
    pub fn search(config: &RetrievalConfig, k: Option<usize>, threshold: Option<f32>) -> Self {
        Self::new(k.unwrap_or(config.search_k), threshold.unwrap_or(config.threshold))
            .with_weak_threshold(config.weak_threshold)
    }

    fn classify(&self, distance: f32) -> Option<Confidence> {
        if distance < self.threshold {
            return Some(Confidence::Strong);
        }
        match self.weak_threshold {
            Some(weak) if distance < weak => Some(Confidence::Weak),
            _ => None,
        }
    }
}

/// Whether a match cleared the strict threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Strong,
    Weak,
}

/// A record that passed the distance filter.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedMemory {
    pub id: String,
    pub content: String,
    pub metadata: MemoryMetadata,
    pub distance: f32,
    pub confidence: Confidence,
}

impl RetrievedMemory {
    fn from_record(record: MemoryRecord, distance: f32, confidence: Confidence) -> Self {
        Self {
            metadata: record.metadata(),
            id: record.id,
            content: record.content,
            distance,
            confidence,
        }
    }

    /// One context line: `[ID: <id>] <content>`.
    pub fn context_line(&self) -> String {
        match self.confidence {
            Confidence::Strong => format!("[ID: {}] {}", self.id, self.content),
            Confidence::Weak => format!("[ID: {}] (low confidence) {}", self.id, self.content),
        }
    }
}

/// Formatted context plus the matches it was built from.
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    /// Newline-joined context lines; empty when nothing matched.
    pub text: String,
    pub matches: Vec<RetrievedMemory>,
}

impl RetrievedContext {
    pub fn count(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Threshold-filtered view over a [`MemoryStore`].
pub struct RetrievalEngine {
    store: Arc<MemoryStore>,
}

impl RetrievalEngine {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Matches for `text` under `policy`, ascending by distance.
    pub async fn search(
        &self,
        text: &str,
        policy: RetrievalPolicy,
    ) -> Result<Vec<RetrievedMemory>, MembridgeError> {
        let candidates = self.store.query(text, policy.k).await?;
        let total = candidates.len();

        let matches: Vec<RetrievedMemory> = candidates
            .into_iter()
            .filter_map(|scored| {
                policy
                    .classify(scored.distance)
                    .map(|confidence| RetrievedMemory::from_record(scored.record, scored.distance, confidence))
            })
            .collect();

        debug!(
            candidates = total,
            matched = matches.len(),
            threshold = policy.threshold,
            "retrieval filtered"
        );
        metrics::histogram!("membridge_retrieval_matches").record(matches.len() as f64);
        Ok(matches)
    }

    /// Build the decision-engine context for `text`.
    pub async fn retrieve(
        &self,
        text: &str,
        policy: RetrievalPolicy,
    ) -> Result<RetrievedContext, MembridgeError> {
        let matches = self.search(text, policy).await?;
        let text = matches
            .iter()
            .map(RetrievedMemory::context_line)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(RetrievedContext { text, matches })
    }
}

/// Ids referenced by `[ID: <hex>]` markers at the start of a line, in order.
///
/// Markers inside memory text are not ids.
pub fn extract_ids(context: &str) -> Vec<String> {
    ID_MARKER
        .captures_iter(context)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
