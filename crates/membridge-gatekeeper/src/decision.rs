// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decision types returned by the gatekeeper.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Placeholder target when an UPDATE names no resolvable memory.
pub const UNKNOWN_TARGET: &str = "unknown";

/// Tag attached to input saved because the oracle failed.
pub const RAW_FALLBACK_TAG: &str = "raw_fallback";

/// What should happen to the input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Intent {
    /// New knowledge; store it.
    Save,
    /// Refines or contradicts a memory in the context.
    Update,
    /// Filler or duplicate.
    Discard,
}

/// Outcome of classifying one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub intent: Intent,
    pub reason: String,
    /// Text to store. Empty for DISCARD.
    pub content: String,
    pub tags: Vec<String>,
    /// Memory to update. Set only for UPDATE; may be [`UNKNOWN_TARGET`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

impl Decision {
    /// The decision used whenever the oracle cannot be trusted.
    pub fn raw_fallback(input: &str, reason: impl Into<String>) -> Self {
        Self {
            intent: Intent::Save,
            reason: reason.into(),
            content: input.to_string(),
            tags: vec![RAW_FALLBACK_TAG.to_string()],
            target_id: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.tags.iter().any(|t| t == RAW_FALLBACK_TAG)
    }

    /// True for an UPDATE whose target could not be resolved.
    pub fn has_unknown_target(&self) -> bool {
        self.intent == Intent::Update
            && self.target_id.as_deref().is_none_or(|t| t == UNKNOWN_TARGET)
    }
}
