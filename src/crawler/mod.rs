//! Crawl orchestration
//!
//! - [`Browser`]: owns the queues, downloader, archive and sink and runs the
//!   browse, harvest and extract phases
//! - [`Backoff`]: pause policy used while a queue hands out nothing
//! - [`PhaseReport`]: per-phase counters returned to the caller

mod backoff;
mod browser;
mod report;

pub use backoff::Backoff;
pub use browser::Browser;
pub use report::{Phase, PhaseReport};
