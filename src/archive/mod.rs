//! Archive store module
//!
//! Harvested page bodies are kept in an append-only store until the extract
//! phase consumes them. Consumption only drops an entry from the in-memory
//! index; the bytes stay in place on disk.
//!
//! - [`ZipArchiveStore`] packs entries into size-capped, bzip2-compressed zip
//!   containers named `<prefix><n>.<extension>` and reindexes existing
//!   containers when opened.
//! - [`MemoryArchiveStore`] keeps everything in process memory.
//!
//! Both hand entries back in LIFO order: the most recently indexed entry
//! comes out first.

mod memory;
mod traits;
mod zip_store;

pub use memory::MemoryArchiveStore;
pub use traits::{ArchiveError, ArchiveResult, ArchiveStore};
pub use zip_store::{container_name, ZipArchiveStore};

use crate::config::ArchiveConfig;
use std::path::Path;

/// Opens the on-disk archive store described by the configuration
pub fn open_store(config: &ArchiveConfig) -> ArchiveResult<ZipArchiveStore> {
    ZipArchiveStore::open(
        Path::new(&config.directory),
        &config.prefix,
        &config.extension,
        config.max_size,
    )
}
