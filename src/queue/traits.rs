//! Work queue trait and error types
//!
//! This module defines the trait interface for queue backends and
//! associated error types.

use thiserror::Error;

/// Errors that can occur during queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Queue backend error: {0}")]
    Backend(String),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Trait for work queue implementations
///
/// Every implementation must uphold the at-most-once discovery guarantee:
/// an item offered through [`WorkQueue::enqueue`] becomes pending only the
/// first time it is seen during the queue's lifetime. A backend shared by
/// several processes has to make the check-and-insert atomic.
pub trait WorkQueue: Send {
    /// Name of the queue, used in log output
    fn name(&self) -> &str;

    /// Adds an item if it has never been enqueued before
    ///
    /// # Returns
    ///
    /// `true` if the item was new and is now pending, `false` if it was
    /// already seen and nothing changed
    fn enqueue(&mut self, item: &str) -> QueueResult<bool>;

    /// Appends an item unconditionally, ignoring the seen set
    ///
    /// Only used to retry an item whose fetch failed transiently.
    fn re_enqueue(&mut self, item: &str) -> QueueResult<()>;

    /// Removes and returns the oldest pending item
    ///
    /// `Ok(None)` means no item is available right now. That is a normal
    /// condition the caller is expected to back off from, not an error.
    fn dequeue(&mut self) -> QueueResult<Option<String>>;

    /// Number of pending items
    ///
    /// This counts pending items only; items that were seen and already
    /// dequeued do not contribute. Remote backends may report an
    /// approximation.
    fn len(&self) -> QueueResult<usize>;

    /// Returns true when no item is pending
    fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns true if the item has ever been enqueued in this queue
    fn contains(&self, item: &str) -> QueueResult<bool>;
}
