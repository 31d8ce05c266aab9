// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup: PRAGMAs, WAL mode, and migrations.
//!
//! All reads and writes go through the one `tokio_rusqlite::Connection`
//! returned here, so every store operation runs on a single background thread.

use std::path::Path;

use membridge_core::MembridgeError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Convert a tokio-rusqlite error into `MembridgeError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MembridgeError {
    MembridgeError::storage(e)
}

/// Open (creating if needed) the database at `path` and apply migrations.
pub async fn open_database(path: &str, wal_mode: bool) -> Result<Connection, MembridgeError> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(MembridgeError::storage)?;
    }

    let conn = Connection::open(path).await.map_err(MembridgeError::storage)?;
    prepare(&conn, wal_mode).await?;
    debug!(path, wal_mode, "memory database opened");
    Ok(conn)
}

/// Open a private in-memory database with migrations applied.
pub async fn open_in_memory() -> Result<Connection, MembridgeError> {
    let conn = Connection::open_in_memory()
        .await
        .map_err(MembridgeError::storage)?;
    prepare(&conn, false).await?;
    Ok(conn)
}

async fn prepare(conn: &Connection, wal_mode: bool) -> Result<(), MembridgeError> {
    conn.call(move |conn| -> Result<(), rusqlite::Error> {
        if wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
        }
        conn.pragma_update(None, "busy_timeout", 5000)?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)?;

    conn.call(|conn| -> Result<Result<(), MembridgeError>, rusqlite::Error> {
        Ok(run_migrations(conn))
    })
    .await
    .map_err(map_tr_err)?
}

/// Flush the WAL into the main database file before shutdown.
pub async fn checkpoint(conn: &Connection) -> Result<(), MembridgeError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)?;
    debug!("WAL checkpoint complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_has_memories_table() {
        let conn = open_in_memory().await.unwrap();
        let count: i64 = conn
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn file_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memories.db");
        let conn = open_database(path.to_str().unwrap(), true).await.unwrap();
        checkpoint(&conn).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.db");
        let path = path.to_str().unwrap();
        drop(open_database(path, false).await.unwrap());
        assert!(open_database(path, false).await.is_ok());
    }
}
