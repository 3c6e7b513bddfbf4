//! In-memory record sink

use crate::extract::Record;
use crate::sink::traits::{RecordSink, SinkResult};

/// Collects records in a vector
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<Record>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written so far, in write order
    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, records: &[Record]) -> SinkResult<usize> {
        self.records.extend_from_slice(records);
        Ok(records.len())
    }
}
