//! CSV record sink

use crate::extract::Record;
use crate::sink::traits::{RecordSink, SinkError, SinkResult};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Appends records as CSV rows with a fixed column order
///
/// The header row is written only when the file is created (or empty).
/// Fields missing from a record become empty cells; keys not listed in
/// `columns` are ignored.
pub struct CsvSink {
    writer: csv::Writer<File>,
    columns: Vec<String>,
}

impl CsvSink {
    /// Opens `path` for appending with the given column order
    pub fn open(path: &Path, columns: &[String]) -> SinkResult<Self> {
        if columns.is_empty() {
            return Err(SinkError::Invalid(
                "CSV sink needs at least one column".to_string(),
            ));
        }

        let needs_header = path.metadata().map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(columns)?;
            writer.flush()?;
        }

        Ok(Self {
            writer,
            columns: columns.to_vec(),
        })
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl RecordSink for CsvSink {
    fn write(&mut self, records: &[Record]) -> SinkResult<usize> {
        for record in records {
            let row: Vec<String> = self
                .columns
                .iter()
                .map(|column| cell(record.get(column)))
                .collect();
            self.writer.write_record(&row)?;
        }
        self.writer.flush()?;
        Ok(records.len())
    }
}
