//! Archive store trait and error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive store is empty")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Entry '{name}' missing from container {}", path.display())]
    MissingEntry { path: PathBuf, name: String },
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Trait for archive store implementations
///
/// Stores are append-only. [`ArchiveStore::get`] removes an entry from the
/// pending index but never deletes stored bytes.
pub trait ArchiveStore: Send {
    /// Stores `data` under `id`
    fn put(&mut self, id: &str, data: &[u8]) -> ArchiveResult<()>;

    /// Removes and returns the most recently indexed, not yet consumed entry
    ///
    /// Fails with [`ArchiveError::Empty`] when nothing is pending.
    fn get(&mut self) -> ArchiveResult<(String, Vec<u8>)>;

    /// Number of entries indexed but not yet consumed
    fn len(&self) -> usize;

    /// Returns true when no entry is pending
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
