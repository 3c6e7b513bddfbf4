//! Zip-container archive store
//!
//! Entries are appended to the container `<prefix><n>.<extension>` in the
//! store directory, compressed with bzip2. Before every write the store
//! checks the current container: once its size has passed the cap, writing
//! moves on to container `n + 1`. The cap is therefore soft; a container may
//! overshoot it by one entry.

use crate::archive::traits::{ArchiveError, ArchiveResult, ArchiveStore};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::Span;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Builds the file name of container number `n`
pub fn container_name(prefix: &str, extension: &str, n: u32) -> String {
    format!("{}{}.{}", prefix, n, extension)
}

/// Archive store backed by a directory of zip containers
pub struct ZipArchiveStore {
    directory: PathBuf,
    prefix: String,
    extension: String,
    max_size: u64,
    /// Number of the container the next write goes to (before the size check)
    sequence: u32,
    /// Entry names already present in the current container
    current_names: HashSet<String>,
    /// Pending entries, oldest first; consumed from the back
    index: Vec<(PathBuf, String)>,
    span: Span,
}

impl ZipArchiveStore {
    /// Opens a store in `directory`, indexing every existing container
    ///
    /// Containers are scanned in ascending number order. A container that
    /// cannot be read is logged and skipped, but its number stays taken.
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory holding the containers (created if missing)
    /// * `prefix` - File name prefix, e.g. `harvest_`
    /// * `extension` - File extension without the dot, e.g. `bz2`
    /// * `max_size` - Size in bytes after which a new container is started
    pub fn open(
        directory: &Path,
        prefix: &str,
        extension: &str,
        max_size: u64,
    ) -> ArchiveResult<Self> {
        fs::create_dir_all(directory)?;

        let mut store = Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
            max_size,
            sequence: 1,
            current_names: HashSet::new(),
            index: Vec::new(),
            span: tracing::info_span!("archive", directory = %directory.display()),
        };

        store.reindex()?;
        Ok(store)
    }

    /// Replaces the tracing span log lines are attached to
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Number of the container the store is currently writing to
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Path of container number `n`
    pub fn container_path(&self, n: u32) -> PathBuf {
        self.directory
            .join(container_name(&self.prefix, &self.extension, n))
    }

    /// Lists existing containers in ascending number order
    pub fn containers(&self) -> ArchiveResult<Vec<(u32, PathBuf)>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(n) = self.parse_container_number(file_name) {
                found.push((n, entry.path()));
            }
        }
        found.sort_by_key(|(n, _)| *n);
        Ok(found)
    }

    fn parse_container_number(&self, file_name: &str) -> Option<u32> {
        let rest = file_name.strip_prefix(&self.prefix)?;
        let digits = rest.strip_suffix(&self.extension)?.strip_suffix('.')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    fn reindex(&mut self) -> ArchiveResult<()> {
        let containers = self.containers()?;
        let mut last_readable = true;

        for (n, path) in &containers {
            last_readable = true;
            match read_entry_names(path) {
                Ok(names) => {
                    tracing::debug!(
                        parent: &self.span,
                        "Indexed {} entries from {}",
                        names.len(),
                        path.display()
                    );
                    self.index
                        .extend(names.into_iter().map(|name| (path.clone(), name)));
                }
                Err(e) => {
                    last_readable = false;
                    tracing::warn!(
                        parent: &self.span,
                        "Skipping unreadable container {}: {}",
                        path.display(),
                        e
                    );
                }
            }
            self.sequence = *n;
        }

        if !last_readable {
            self.sequence += 1;
        }

        let current = self.container_path(self.sequence);
        self.current_names = read_entry_names(&current)
            .map(|names| names.into_iter().collect())
            .unwrap_or_default();

        if !containers.is_empty() {
            tracing::info!(
                parent: &self.span,
                "Reindexed {} containers with {} pending entries",
                containers.len(),
                self.index.len()
            );
        }
        Ok(())
    }

    /// Moves to the next container while the current one is full or already
    /// holds an entry called `id`
    fn roll_if_needed(&mut self, id: &str) -> ArchiveResult<PathBuf> {
        loop {
            let path = self.container_path(self.sequence);
            let size = match fs::metadata(&path) {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(path),
                Err(e) => return Err(e.into()),
            };

            if size <= self.max_size && !self.current_names.contains(id) {
                return Ok(path);
            }

            self.sequence += 1;
            self.current_names.clear();
            tracing::debug!(
                parent: &self.span,
                "Rolling over to {}",
                self.container_path(self.sequence).display()
            );
        }
    }
}

impl ArchiveStore for ZipArchiveStore {
    fn put(&mut self, id: &str, data: &[u8]) -> ArchiveResult<()> {
        let path = self.roll_if_needed(id)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut writer = if file.metadata()?.len() == 0 {
            ZipWriter::new(file)
        } else {
            ZipWriter::new_append(file)?
        };

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Bzip2);
        writer.start_file(id, options)?;
        writer.write_all(data)?;
        writer.finish()?;

        tracing::debug!(parent: &self.span, "Stored {} in {}", id, path.display());
        self.current_names.insert(id.to_string());
        self.index.push((path, id.to_string()));
        Ok(())
    }

    fn get(&mut self) -> ArchiveResult<(String, Vec<u8>)> {
        let (path, name) = self.index.pop().ok_or(ArchiveError::Empty)?;

        match read_entry(&path, &name) {
            Ok(data) => Ok((name, data)),
            Err(e) => {
                // Leave the entry pending so a later run can retry it
                self.index.push((path, name));
                Err(e)
            }
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

fn read_entry_names(path: &Path) -> ArchiveResult<Vec<String>> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        names.push(entry.name().to_string());
    }
    Ok(names)
}

fn read_entry(path: &Path, name: &str) -> ArchiveResult<Vec<u8>> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ArchiveError::MissingEntry {
                path: path.to_path_buf(),
                name: name.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;
    Ok(data)
}
