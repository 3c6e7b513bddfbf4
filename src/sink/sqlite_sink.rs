//! SQLite record sink
//!
//! Records are inserted into an existing table. The sink never creates or
//! migrates tables; the embedder owns the schema.

use crate::extract::Record;
use crate::sink::traits::{RecordSink, SinkError, SinkResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use std::path::Path;

/// Returns true if `name` is safe to splice into SQL as an identifier
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Inserts records as rows of a pre-existing table
pub struct SqliteSink {
    conn: Connection,
    insert_sql: String,
    columns: Vec<String>,
}

impl SqliteSink {
    /// Opens the database at `path` and checks that `table` exists
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `table` - Destination table; must already exist
    /// * `columns` - Record fields to insert, in column order
    pub fn open(path: &Path, table: &str, columns: &[String]) -> SinkResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, table, columns)
    }

    /// Wraps an already open connection
    pub fn from_connection(conn: Connection, table: &str, columns: &[String]) -> SinkResult<Self> {
        if !is_valid_identifier(table) {
            return Err(SinkError::Invalid(format!("invalid table name '{}'", table)));
        }
        if columns.is_empty() {
            return Err(SinkError::Invalid(
                "SQLite sink needs at least one column".to_string(),
            ));
        }
        if let Some(bad) = columns.iter().find(|c| !is_valid_identifier(c)) {
            return Err(SinkError::Invalid(format!("invalid column name '{}'", bad)));
        }

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(SinkError::MissingTable(table.to_string()));
        }

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );

        Ok(Self {
            conn,
            insert_sql,
            columns: columns.to_vec(),
        })
    }
}

fn to_sql_value(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

impl RecordSink for SqliteSink {
    fn write(&mut self, records: &[Record]) -> SinkResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(&self.insert_sql)?;
            for record in records {
                let values = self.columns.iter().map(|c| to_sql_value(record.get(c)));
                inserted += stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_sink() -> SqliteSink {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE books (title TEXT NOT NULL, price TEXT, stock INTEGER)")
            .unwrap();
        SqliteSink::from_connection(
            conn,
            "books",
            &["title".to_string(), "price".to_string(), "stock".to_string()],
        )
        .unwrap()
    }

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_insert_returns_rows_affected() {
        let mut sink = create_test_sink();
        let written = sink
            .write(&[
                record(json!({"title": "A", "price": "1.00", "stock": 3})),
                record(json!({"title": "B"})),
            ])
            .unwrap();
        assert_eq!(written, 2);

        let (count, stock): (i64, Option<i64>) = sink
            .conn
            .query_row(
                "SELECT COUNT(*), MAX(stock) FROM books",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(stock, Some(3));
    }

    #[test]
    fn test_failed_batch_is_rolled_back() {
        let mut sink = create_test_sink();
        let result = sink.write(&[
            record(json!({"title": "ok"})),
            record(json!({"price": "no title"})),
        ]);
        assert!(matches!(result, Err(SinkError::Sqlite(_))));

        let count: i64 = sink
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let result = SqliteSink::from_connection(conn, "nope", &["a".to_string()]);
        assert!(matches!(result, Err(SinkError::MissingTable(_))));
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let conn = Connection::open_in_memory().unwrap();
        let result = SqliteSink::from_connection(conn, "books; DROP", &["a".to_string()]);
        assert!(matches!(result, Err(SinkError::Invalid(_))));
        assert!(is_valid_identifier("records_2024"));
        assert!(!is_valid_identifier(""));
    }
}
