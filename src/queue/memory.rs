//! In-memory work queue

use crate::queue::traits::{QueueResult, WorkQueue};
use std::collections::{HashSet, VecDeque};
use tracing::Span;

/// Work queue held entirely in process memory
///
/// Pending items live in a `VecDeque` (pushed at the back, popped at the
/// front); the seen set is a `HashSet` keyed on the exact item string.
#[derive(Debug)]
pub struct MemoryQueue {
    name: String,
    pending: VecDeque<String>,
    seen: HashSet<String>,
    span: Span,
}

impl MemoryQueue {
    /// Creates an empty queue
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
            span: tracing::info_span!("queue", name = %name),
        }
    }

    /// Creates an empty queue that remembers items seen by a previous run
    ///
    /// Items in `seen` will be ignored by [`WorkQueue::enqueue`], which lets
    /// a resumed crawl skip pages it already discovered.
    pub fn with_seen<I, S>(name: &str, seen: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue = Self::new(name);
        queue.seen.extend(seen.into_iter().map(Into::into));
        queue
    }

    /// Replaces the tracing span log lines are attached to
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Number of distinct items ever enqueued
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

impl WorkQueue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn enqueue(&mut self, item: &str) -> QueueResult<bool> {
        if self.seen.contains(item) {
            return Ok(false);
        }
        tracing::debug!(parent: &self.span, "Enqueue to {}: {}", self.name, item);
        self.seen.insert(item.to_string());
        self.pending.push_back(item.to_string());
        Ok(true)
    }

    fn re_enqueue(&mut self, item: &str) -> QueueResult<()> {
        tracing::debug!(parent: &self.span, "Re-enqueue to {}: {}", self.name, item);
        self.pending.push_back(item.to_string());
        Ok(())
    }

    fn dequeue(&mut self) -> QueueResult<Option<String>> {
        let item = self.pending.pop_front();
        if let Some(ref item) = item {
            tracing::debug!(parent: &self.span, "Dequeue from {}: {}", self.name, item);
        }
        Ok(item)
    }

    fn len(&self) -> QueueResult<usize> {
        Ok(self.pending.len())
    }

    fn contains(&self, item: &str) -> QueueResult<bool> {
        Ok(self.seen.contains(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_queue_is_empty() {
        let queue = MemoryQueue::new("test");
        assert_eq!(queue.len().unwrap(), 0);
        assert!(queue.is_empty().unwrap());
        assert_eq!(queue.name(), "test");
    }

    #[test]
    fn test_enqueue_dedup() {
        let mut queue = MemoryQueue::new("test");
        assert!(queue.enqueue("a").unwrap());
        assert!(!queue.enqueue("a").unwrap());
        assert!(!queue.enqueue("a").unwrap());
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn test_dedup_survives_dequeue() {
        let mut queue = MemoryQueue::new("test");
        queue.enqueue("a").unwrap();
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("a"));

        // Already seen, so a second discovery is ignored
        assert!(!queue.enqueue("a").unwrap());
        assert!(queue.is_empty().unwrap());
        assert!(queue.contains("a").unwrap());
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = MemoryQueue::new("test");
        for item in ["a", "b", "c"] {
            queue.enqueue(item).unwrap();
        }
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("a"));
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("b"));
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("c"));
        assert_eq!(queue.dequeue().unwrap(), None);
    }

    #[test]
    fn test_re_enqueue_bypasses_dedup() {
        let mut queue = MemoryQueue::new("test");
        queue.enqueue("a").unwrap();
        queue.re_enqueue("a").unwrap();
        queue.re_enqueue("a").unwrap();
        assert_eq!(queue.len().unwrap(), 3);
        assert_eq!(queue.seen_count(), 1);
    }

    #[test]
    fn test_re_enqueue_goes_to_the_back() {
        let mut queue = MemoryQueue::new("test");
        queue.enqueue("a").unwrap();
        queue.enqueue("b").unwrap();
        let first = queue.dequeue().unwrap().unwrap();
        queue.re_enqueue(&first).unwrap();
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("b"));
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn test_dequeue_empty_is_not_an_error() {
        let mut queue = MemoryQueue::new("test");
        assert!(queue.dequeue().unwrap().is_none());
    }

    #[test]
    fn test_is_empty_ignores_seen_set() {
        let mut queue = MemoryQueue::new("test");
        queue.enqueue("a").unwrap();
        queue.enqueue("b").unwrap();
        queue.dequeue().unwrap();
        assert!(!queue.is_empty().unwrap());
        queue.dequeue().unwrap();
        assert!(queue.is_empty().unwrap());
        assert_eq!(queue.seen_count(), 2);
    }

    #[test]
    fn test_with_seen_restores_dedup_state() {
        let mut queue = MemoryQueue::with_seen("test", ["a", "b"]);
        assert!(queue.is_empty().unwrap());
        assert!(!queue.enqueue("a").unwrap());
        assert!(queue.enqueue("c").unwrap());
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn test_at_most_one_pending_per_item() {
        let mut queue = MemoryQueue::new("test");
        let items = ["x", "y", "x", "z", "y", "x"];
        for item in items {
            queue.enqueue(item).unwrap();
        }
        let mut drained = Vec::new();
        while let Some(item) = queue.dequeue().unwrap() {
            drained.push(item);
        }
        assert_eq!(drained, vec!["x", "y", "z"]);
    }
}
