// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lenient parsing of the oracle's JSON answer.

use std::str::FromStr;

use membridge_core::MembridgeError;
use serde::Deserialize;
use tracing::debug;

use crate::decision::Intent;

/// Classification as the oracle reported it, before policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub reason: String,
    pub content: String,
    pub tags: Vec<String>,
    pub target_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tags: Option<RawTags>,
    #[serde(default)]
    target_id: Option<serde_json::Value>,
}

/// Models sometimes return tags as one comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Joined(String),
}

impl RawTags {
    fn into_vec(self) -> Vec<String> {
        let tags = match self {
            RawTags::List(tags) => tags,
            RawTags::Joined(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
        };
        tags.into_iter().filter(|t| !t.trim().is_empty()).collect()
    }
}

/// Parse the oracle's reply into a [`Classification`].
///
/// Accepts markdown code fences and prose around the object; the outermost
/// `{...}` span is parsed. A missing or unrecognized intent is an error.
pub fn parse_classification(response: &str) -> Result<Classification, MembridgeError> {
    let json_str = extract_json_object(response).ok_or_else(|| MembridgeError::Oracle {
        message: "response contains no JSON object".to_string(),
    })?;

    let raw: RawClassification = serde_json::from_str(json_str).map_err(|e| {
        debug!(raw = %response, "unparseable classification");
        MembridgeError::Oracle {
            message: format!("invalid classification JSON: {e}"),
        }
    })?;

    let intent_str = raw.intent.ok_or_else(|| MembridgeError::Oracle {
        message: "classification has no intent".to_string(),
    })?;
    let intent = Intent::from_str(intent_str.trim()).map_err(|_| MembridgeError::Oracle {
        message: format!("unrecognized intent `{intent_str}`"),
    })?;

    let target_id = match raw.target_id {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(Classification {
        intent,
        reason: raw.reason.unwrap_or_default(),
        content: raw.content.unwrap_or_default(),
        tags: raw.tags.map(RawTags::into_vec).unwrap_or_default(),
        target_id,
    })
}

fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}
