// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store with BLOB embeddings and exact vector query.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use membridge_core::error::MembridgeError;
use membridge_core::traits::EmbeddingAdapter;
use membridge_core::types::EmbeddingInput;
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use crate::database::{self, map_tr_err};
use crate::types::{
    blob_to_vec, format_timestamp, memory_id, normalize_source, normalize_tags,
    squared_l2_distance, vec_to_blob, MemoryRecord, NewMemory, ScoredMemory,
};

const RECORD_COLUMNS: &str = "id, content, tags, updated_at, created_at, source, source_url";

/// Persistent, embedding-indexed collection of memory records.
///
/// Every operation is a single closure on the tokio-rusqlite thread, so each
/// write is atomic and visible to the next query as soon as it returns.
pub struct MemoryStore {
    conn: Connection,
    embedder: Arc<dyn EmbeddingAdapter>,
}

impl MemoryStore {
    /// Wrap a connection that already has migrations applied.
    pub fn new(conn: Connection, embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self { conn, embedder }
    }

    /// Open the database file at `path` and build a store over it.
    pub async fn open(
        path: &str,
        wal_mode: bool,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, MembridgeError> {
        let conn = database::open_database(path, wal_mode).await?;
        Ok(Self::new(conn, embedder))
    }

    /// Build a store over a fresh in-memory database.
    pub async fn open_in_memory(embedder: Arc<dyn EmbeddingAdapter>) -> Result<Self, MembridgeError> {
        let conn = database::open_in_memory().await?;
        Ok(Self::new(conn, embedder))
    }

    /// Name of the embedder backing this store.
    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MembridgeError> {
        let output = self.embedder.embed(EmbeddingInput::single(text)).await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MembridgeError::Internal("embedding returned no results".to_string()))
    }

    /// Persist a new memory and return its id.
    ///
    /// Identical content inserted at the identical instant would hash to the
    /// same id; the creation time is then advanced by one microsecond until
    /// the id is free, so this never fails on duplicate content.
    pub async fn insert(&self, memory: NewMemory) -> Result<String, MembridgeError> {
        let embedding_blob = vec_to_blob(&self.embed(&memory.content).await?);
        let tags_json = tags_to_json(&normalize_tags(&memory.tags))?;
        let source = normalize_source(memory.source.as_deref());
        let source_url = memory
            .source_url
            .filter(|u| !u.trim().is_empty());
        let content = memory.content;

        let id = self
            .conn
            .call(move |conn| -> Result<String, rusqlite::Error> {
                let mut created = Utc::now();
                loop {
                    let created_at = format_timestamp(created);
                    let id = memory_id(&content, &created_at);
                    let inserted = conn.execute(
                        "INSERT OR IGNORE INTO memories (id, content, embedding, tags, source, source_url, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                        rusqlite::params![id, content, embedding_blob, tags_json, source, source_url, created_at],
                    )?;
                    if inserted == 1 {
                        return Ok(id);
                    }
                    created += Duration::microseconds(1);
                }
            })
            .await
            .map_err(map_tr_err)?;

        metrics::counter!("membridge_memory_writes_total", "op" => "insert").increment(1);
        debug!(id = %id, "memory inserted");
        Ok(id)
    }

    /// Replace a record's content, re-embed it, and refresh its timestamp.
    ///
    /// `new_tags = None` keeps the existing tags. Source fields are never touched.
    pub async fn update(
        &self,
        id: &str,
        new_content: &str,
        new_tags: Option<Vec<String>>,
    ) -> Result<(), MembridgeError> {
        let embedding_blob = vec_to_blob(&self.embed(new_content).await?);
        let tags_json = match new_tags {
            Some(tags) => Some(tags_to_json(&normalize_tags(&tags))?),
            None => None,
        };
        let owned_id = id.to_string();
        let content = new_content.to_string();
        let updated_at = format_timestamp(Utc::now());

        let changed = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE memories SET content = ?1, embedding = ?2, tags = COALESCE(?3, tags), updated_at = ?4 WHERE id = ?5",
                    rusqlite::params![content, embedding_blob, tags_json, updated_at, owned_id],
                )
            })
            .await
            .map_err(map_tr_err)?;

        if changed == 0 {
            return Err(MembridgeError::NotFound { id: id.to_string() });
        }
        metrics::counter!("membridge_memory_writes_total", "op" => "update").increment(1);
        debug!(id, "memory updated");
        Ok(())
    }

    /// Remove a record and its embedding.
    pub async fn delete(&self, id: &str) -> Result<(), MembridgeError> {
        let owned_id = id.to_string();
        let changed = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM memories WHERE id = ?1", rusqlite::params![owned_id])
            })
            .await
            .map_err(map_tr_err)?;

        if changed == 0 {
            return Err(MembridgeError::NotFound { id: id.to_string() });
        }
        metrics::counter!("membridge_memory_writes_total", "op" => "delete").increment(1);
        debug!(id, "memory deleted");
        Ok(())
    }

    /// Fetch one record by id.
    pub async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MembridgeError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<MemoryRecord>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM memories WHERE id = ?1"
                ))?;
                stmt.query_row(rusqlite::params![id], row_to_record).optional()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<usize, MembridgeError> {
        let count = self
            .conn
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Most recently written records, newest first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<MemoryRecord>, MembridgeError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<Vec<MemoryRecord>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM memories ORDER BY updated_at DESC, id LIMIT ?1"
                ))?;
                let records = stmt
                    .query_map(rusqlite::params![limit], row_to_record)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Nearest records to `text`, ascending by distance, at most `k` of them.
    ///
    /// Exact search over every stored vector. Ties are broken by id so the
    /// order is stable. Rows whose vector width differs from the query (a
    /// database written by another embedder) are skipped.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredMemory>, MembridgeError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embed(text).await?;

        let rows = self
            .conn
            .call(|conn| -> Result<Vec<(MemoryRecord, Vec<u8>)>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS}, embedding FROM memories"
                ))?;
                let rows = stmt
                    .query_map([], |row| {
                        let record = row_to_record(row)?;
                        let blob: Vec<u8> = row.get(7)?;
                        Ok((record, blob))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        let mut skipped = 0usize;
        let mut scored: Vec<ScoredMemory> = rows
            .into_iter()
            .filter_map(|(record, blob)| {
                match squared_l2_distance(&query_vec, &blob_to_vec(&blob)) {
                    Some(distance) => Some(ScoredMemory { record, distance }),
                    None => {
                        skipped += 1;
                        None
                    }
                }
            })
            .collect();

        if skipped > 0 {
            warn!(skipped, "ignored memories with mismatched embedding width");
        }

        scored.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Checkpoint the WAL so the file is self-contained after exit.
    pub async fn close(&self) -> Result<(), MembridgeError> {
        database::checkpoint(&self.conn).await
    }
}

fn tags_to_json(tags: &BTreeSet<String>) -> Result<String, MembridgeError> {
    serde_json::to_string(tags).map_err(MembridgeError::storage)
}

fn row_to_record(row: &rusqlite::Row) -> Result<MemoryRecord, rusqlite::Error> {
    let tags_json: String = row.get(2)?;
    let tags: BTreeSet<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(MemoryRecord {
        id: row.get(0)?,
        content: row.get(1)?,
        tags,
        timestamp: row.get(3)?,
        created_at: row.get(4)?,
        source: row.get(5)?,
        source_url: row.get(6)?,
    })
}

/// Extension trait for optional row queries.
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbedder;

    async fn test_store() -> MemoryStore {
        MemoryStore::open_in_memory(Arc::new(HashingEmbedder::new(256)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = test_store().await;
        let id = store
            .insert(
                NewMemory::new("User prefers dark roast coffee")
                    .with_tags(["coffee", "preference", "coffee"])
                    .with_source(Some("chatgpt".into()), Some("https://chat.example/c/1".into())),
            )
            .await
            .unwrap();

        let record = store.get(&id).await.unwrap().expect("record exists");
        assert_eq!(record.content, "User prefers dark roast coffee");
        assert_eq!(record.tags.len(), 2);
        assert_eq!(record.source, "chatgpt");
        assert_eq!(record.source_url.as_deref(), Some("https://chat.example/c/1"));
        assert_eq!(record.timestamp, record.created_at);
        assert_eq!(id, memory_id(&record.content, &record.created_at));
    }

    #[tokio::test]
    async fn default_source_is_unknown() {
        let store = test_store().await;
        let id = store.insert(NewMemory::new("plain fact")).await.unwrap();
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.source, "unknown");
        assert!(record.source_url.is_none());
        assert!(record.tags.is_empty());
    }

    #[tokio::test]
    async fn duplicate_content_gets_distinct_ids() {
        let store = test_store().await;
        let a = store.insert(NewMemory::new("same words")).await.unwrap();
        let b = store.insert(NewMemory::new("same words")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn self_match_has_minimum_distance() {
        let store = test_store().await;
        store.insert(NewMemory::new("The cat sleeps on the sofa")).await.unwrap();
        let id = store.insert(NewMemory::new("Rust borrow checker rules")).await.unwrap();
        store.insert(NewMemory::new("Paris is the capital of France")).await.unwrap();

        let results = store.query("Rust borrow checker rules", 3).await.unwrap();
        assert_eq!(results[0].record.id, id);
        assert!(results[0].distance.abs() < 1e-5);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn query_respects_k() {
        let store = test_store().await;
        for i in 0..5 {
            store.insert(NewMemory::new(format!("fact number {i}"))).await.unwrap();
        }
        assert_eq!(store.query("fact", 2).await.unwrap().len(), 2);
        assert_eq!(store.query("fact", 10).await.unwrap().len(), 5);
        assert!(store.query("fact", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_content_and_keeps_provenance() {
        let store = test_store().await;
        let id = store
            .insert(
                NewMemory::new("Lives in Berlin")
                    .with_tags(["location"])
                    .with_source(Some("claude".into()), None),
            )
            .await
            .unwrap();

        store.update(&id, "Lives in Munich", None).await.unwrap();
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.content, "Lives in Munich");
        assert_eq!(record.source, "claude");
        assert!(record.tags.contains("location"));

        store
            .update(&id, "Lives in Munich", Some(vec!["home".into()]))
            .await
            .unwrap();
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.tags.iter().collect::<Vec<_>>(), vec!["home"]);
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let store = test_store().await;
        let err = store.update("deadbeef", "x", None).await.unwrap_err();
        assert!(matches!(err, MembridgeError::NotFound { ref id } if id == "deadbeef"));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = test_store().await;
        let id = store.insert(NewMemory::new("temporary")).await.unwrap();
        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(&id).await.unwrap_err(),
            MembridgeError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn list_recent_is_newest_first() {
        let store = test_store().await;
        let first = store.insert(NewMemory::new("first")).await.unwrap();
        let second = store.insert(NewMemory::new("second")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        store.update(&first, "first, edited", None).await.unwrap();

        let recent = store.list_recent(10).await.unwrap();
        assert_eq!(recent[0].id, first);
        assert_eq!(recent[1].id, second);
    }

    #[tokio::test]
    async fn mismatched_widths_are_skipped() {
        let conn = database::open_in_memory().await.unwrap();
        let narrow = MemoryStore::new(conn.clone(), Arc::new(HashingEmbedder::new(64)));
        narrow.insert(NewMemory::new("narrow vector")).await.unwrap();

        let wide = MemoryStore::new(conn, Arc::new(HashingEmbedder::new(128)));
        wide.insert(NewMemory::new("wide vector")).await.unwrap();

        let results = wide.query("vector", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.content, "wide vector");
    }
}
