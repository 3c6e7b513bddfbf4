//! Work queue module
//!
//! A work queue is a FIFO of pending URLs paired with a "seen" set:
//! - `enqueue` adds an item only the first time it is ever offered
//! - `re_enqueue` bypasses the seen set and is reserved for retries
//! - `dequeue` hands back the oldest pending item, or `None` when idle
//!
//! Two backends are provided: [`MemoryQueue`] for a single process and
//! [`SqliteQueue`] for a durable crawl that survives restarts.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryQueue;
pub use sqlite::SqliteQueue;
pub use traits::{QueueError, QueueResult, WorkQueue};

use crate::config::{QueueBackend, QueueConfig};

/// Opens the browse and harvest queues described by the configuration
///
/// # Returns
///
/// * `Ok((browse, harvest))` - The two independent queues of a crawl
/// * `Err(QueueError)` - The durable backend could not be opened
pub fn open_queues(
    config: &QueueConfig,
) -> QueueResult<(Box<dyn WorkQueue>, Box<dyn WorkQueue>)> {
    match config.backend {
        QueueBackend::Memory => Ok((
            Box::new(MemoryQueue::new("browse")),
            Box::new(MemoryQueue::new("harvest")),
        )),
        QueueBackend::Sqlite => {
            let path = std::path::Path::new(&config.path);
            Ok((
                Box::new(SqliteQueue::open(path, "browse")?),
                Box::new(SqliteQueue::open(path, "harvest")?),
            ))
        }
    }
}
