use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use chrono::Local;
use tracing::warn;

/// Receives every path change an [`ImageEntity`](crate::core::ImageEntity) makes
/// on disk, after it has happened.
pub trait RenameLog: Send + Sync {
    fn record_rename(&self, old: &Path, new: &Path);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenameLog;

impl RenameLog for NoopRenameLog {
    fn record_rename(&self, _old: &Path, _new: &Path) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    pub old: PathBuf,
    pub new: PathBuf,
}

/// Keeps renames in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemoryRenameLog {
    entries: Mutex<Vec<RenameEntry>>,
}

impl MemoryRenameLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<RenameEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RenameLog for MemoryRenameLog {
    fn record_rename(&self, old: &Path, new: &Path) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RenameEntry {
                old: old.to_path_buf(),
                new: new.to_path_buf(),
            });
    }
}

/// Appends one line per rename to a text file:
/// `2026-01-31 18:04:11 | /pics/photo.jpg -> /pics/photo @beach.jpg`.
///
/// The file is opened per record. A write failure is logged and dropped because
/// the rename it describes has already succeeded.
#[derive(Debug, Clone)]
pub struct FileRenameLog {
    path: PathBuf,
}

impl FileRenameLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{line}")
    }
}

impl RenameLog for FileRenameLog {
    fn record_rename(&self, old: &Path, new: &Path) {
        let line = format!(
            "{} | {} -> {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            old.display(),
            new.display()
        );
        if let Err(e) = self.append(&line) {
            warn!(log = %self.path.display(), error = %e, "could not append to rename log");
        }
    }
}
