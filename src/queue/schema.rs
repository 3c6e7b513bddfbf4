//! Database schema for the durable work queue

/// SQL schema for the queue database
///
/// Several named queues share the same tables. `queue_seen` has a composite
/// primary key so `INSERT OR IGNORE` doubles as an atomic insert-if-absent.
pub const SCHEMA_SQL: &str = r#"
-- Pending items, oldest first by id
CREATE TABLE IF NOT EXISTS queue_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    queue TEXT NOT NULL,
    item TEXT NOT NULL,
    enqueued_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_items_queue ON queue_items(queue, id);

-- Every item ever enqueued (dedup set)
CREATE TABLE IF NOT EXISTS queue_seen (
    queue TEXT NOT NULL,
    item TEXT NOT NULL,
    first_seen_at TEXT NOT NULL,
    PRIMARY KEY (queue, item)
);
"#;

/// Initializes the queue schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["queue_items", "queue_seen"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
