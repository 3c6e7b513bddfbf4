//! In-memory archive store

use crate::archive::traits::{ArchiveError, ArchiveResult, ArchiveStore};

/// Archive store that keeps entries in process memory
#[derive(Debug, Default)]
pub struct MemoryArchiveStore {
    entries: Vec<(String, Vec<u8>)>,
}

impl MemoryArchiveStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of pending entries, oldest first
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }
}

impl ArchiveStore for MemoryArchiveStore {
    fn put(&mut self, id: &str, data: &[u8]) -> ArchiveResult<()> {
        self.entries.push((id.to_string(), data.to_vec()));
        Ok(())
    }

    fn get(&mut self) -> ArchiveResult<(String, Vec<u8>)> {
        self.entries.pop().ok_or(ArchiveError::Empty)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
