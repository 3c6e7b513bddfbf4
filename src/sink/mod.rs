//! Record sink module
//!
//! Sinks persist the records produced by the extract phase:
//! - [`JsonLinesSink`] appends one JSON object per line
//! - [`CsvSink`] appends rows under a header written on creation
//! - [`SqliteSink`] inserts rows into an existing table
//! - [`MemorySink`] keeps records in memory

mod csv_sink;
mod jsonl;
mod memory;
mod sqlite_sink;
mod traits;

pub use csv_sink::CsvSink;
pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use sqlite_sink::{is_valid_identifier, SqliteSink};
pub use traits::{RecordSink, SinkError, SinkResult};

use crate::config::{SinkConfig, SinkKind};
use std::path::Path;

/// Opens the sink described by the configuration
pub fn open_sink(config: &SinkConfig) -> SinkResult<Box<dyn RecordSink>> {
    let path = Path::new(&config.path);
    let sink: Box<dyn RecordSink> = match config.kind {
        SinkKind::Jsonl => Box::new(JsonLinesSink::open(path)?),
        SinkKind::Csv => Box::new(CsvSink::open(path, &config.columns)?),
        SinkKind::Sqlite => {
            let table = config
                .table
                .as_deref()
                .ok_or_else(|| SinkError::Invalid("SQLite sink needs a table".to_string()))?;
            Box::new(SqliteSink::open(path, table, &config.columns)?)
        }
    };
    tracing::debug!("Opened {:?} sink at {}", config.kind, config.path);
    Ok(sink)
}
