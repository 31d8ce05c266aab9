// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types and the helpers that derive ids and distances.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Provenance tag used when the caller gives none.
pub const DEFAULT_SOURCE: &str = "unknown";

/// Timestamp format stored in SQLite and returned to callers.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// A single stored memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Content address, fixed for the life of the record.
    pub id: String,
    /// The remembered text.
    pub content: String,
    /// Tag set; never contains duplicates.
    pub tags: BTreeSet<String>,
    /// Creation or last-update time.
    pub timestamp: String,
    /// Creation time, input to the id.
    pub created_at: String,
    /// Origin of the memory.
    pub source: String,
    pub source_url: Option<String>,
}

impl MemoryRecord {
    /// Metadata view used by search responses.
    pub fn metadata(&self) -> MemoryMetadata {
        MemoryMetadata {
            timestamp: self.timestamp.clone(),
            tags: self.tags.iter().cloned().collect(),
            source: self.source.clone(),
            source_url: self.source_url.clone(),
        }
    }
}

/// The non-content fields of a record, as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub timestamp: String,
    pub tags: Vec<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Fields supplied when creating a memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMemory {
    pub content: String,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub source_url: Option<String>,
}

impl NewMemory {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: Option<String>, source_url: Option<String>) -> Self {
        self.source = source;
        self.source_url = source_url;
        self
    }
}

/// A record paired with its distance to a query vector.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    /// Squared L2 distance; lower is closer.
    pub distance: f32,
}

/// Derive the content-addressed id: hex of the first 16 bytes of
/// SHA-256 over the content followed by the creation timestamp.
pub fn memory_id(content: &str, created_at: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(created_at.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// Format a UTC instant the way records store it.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Trim tags, drop blanks, and collapse duplicates.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Normalize an optional provenance field; blank means absent.
pub fn normalize_source(source: Option<&str>) -> String {
    match source.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => DEFAULT_SOURCE.to_string(),
    }
}

/// Convert an f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a SQLite BLOB back to an f32 vector. Trailing partial chunks are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Squared Euclidean distance.
///
/// For unit vectors this equals `2 - 2 * cos`, so it ranges over `[0, 4]`.
/// Returns `None` when the vectors have different lengths.
pub fn squared_l2_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum())
}

/// L2-normalize a vector. The zero vector is returned unchanged.
pub fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}
