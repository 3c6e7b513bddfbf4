//! SQLite-backed work queue
//!
//! Pending items and the seen set are persisted, so a crawl can be stopped
//! and resumed by a later process pointing at the same database file.

use crate::queue::schema::initialize_schema;
use crate::queue::traits::{QueueResult, WorkQueue};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::Span;

/// Durable work queue stored in a SQLite database
pub struct SqliteQueue {
    conn: Connection,
    name: String,
    span: Span,
}

impl SqliteQueue {
    /// Opens (or creates) the named queue inside the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `name` - Queue name; several queues can share one database
    pub fn open(path: &Path, name: &str) -> QueueResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self::from_connection(conn, name))
    }

    /// Creates a queue in a private in-memory database
    pub fn open_in_memory(name: &str) -> QueueResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn, name))
    }

    fn from_connection(conn: Connection, name: &str) -> Self {
        Self {
            conn,
            name: name.to_string(),
            span: tracing::info_span!("queue", name = %name),
        }
    }

    /// Replaces the tracing span log lines are attached to
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Number of distinct items ever enqueued
    pub fn seen_count(&self) -> QueueResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM queue_seen WHERE queue = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn push_pending(conn: &Connection, queue: &str, item: &str) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO queue_items (queue, item, enqueued_at) VALUES (?1, ?2, ?3)",
            params![queue, item, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl WorkQueue for SqliteQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn enqueue(&mut self, item: &str) -> QueueResult<bool> {
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO queue_seen (queue, item, first_seen_at) VALUES (?1, ?2, ?3)",
            params![self.name, item, Utc::now().to_rfc3339()],
        )?;

        if inserted == 1 {
            Self::push_pending(&tx, &self.name, item)?;
        }

        tx.commit()?;

        if inserted == 1 {
            tracing::debug!(parent: &self.span, "Enqueue to {}: {}", self.name, item);
        }
        Ok(inserted == 1)
    }

    fn re_enqueue(&mut self, item: &str) -> QueueResult<()> {
        Self::push_pending(&self.conn, &self.name, item)?;
        tracing::debug!(parent: &self.span, "Re-enqueue to {}: {}", self.name, item);
        Ok(())
    }

    fn dequeue(&mut self) -> QueueResult<Option<String>> {
        // Take the write lock before reading the head so processes sharing
        // the database never pop the same row
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let head: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, item FROM queue_items WHERE queue = ?1 ORDER BY id LIMIT 1",
                params![self.name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let item = match head {
            Some((id, item)) => {
                tx.execute("DELETE FROM queue_items WHERE id = ?1", params![id])?;
                Some(item)
            }
            None => None,
        };

        tx.commit()?;

        if let Some(ref item) = item {
            tracing::debug!(parent: &self.span, "Dequeue from {}: {}", self.name, item);
        }
        Ok(item)
    }

    fn len(&self) -> QueueResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM queue_items WHERE queue = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn contains(&self, item: &str) -> QueueResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM queue_seen WHERE queue = ?1 AND item = ?2",
                params![self.name, item],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
