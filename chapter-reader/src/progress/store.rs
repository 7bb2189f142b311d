//! Progress persistence: loading and saving per-book progress.
//!
//! Every save merges with what is already stored so the completed chapter
//! index never goes backwards, even when two writers race.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use super::types::BookProgress;

/// Storage for per-book progress records.
pub trait ProgressStore {
    /// Load a book's progress, or a fresh record if none is stored.
    fn load_progress(&self, book_id: &str) -> Result<BookProgress>;

    /// Save a book's progress, returning the record actually stored.
    fn save_progress(&self, book_id: &str, progress: &BookProgress) -> Result<BookProgress>;
}

/// Merge an incoming record with the stored one for a write.
fn merge_for_write(
    book_id: &str,
    stored: Option<&BookProgress>,
    incoming: &BookProgress,
) -> BookProgress {
    match stored {
        Some(stored) => {
            if stored.completed_index() > incoming.completed_index() {
                log::warn!(
                    "Kept completed chapter {} for {} over older write ({})",
                    stored.completed_index(),
                    book_id,
                    incoming.completed_index()
                );
            }
            incoming.merged_with(stored)
        }
        None => incoming.clone(),
    }
}

/// Validate a book id for use as a file name.
fn progress_file_name(book_id: &str) -> Result<String> {
    let valid = !book_id.is_empty()
        && book_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !book_id.starts_with('.');
    if !valid {
        anyhow::bail!("Invalid book id: {:?}", book_id);
    }
    Ok(format!("{}.json", book_id))
}

/// Progress stored as one JSON file per book.
pub struct JsonProgressStore {
    dir: PathBuf,
}

impl JsonProgressStore {
    /// Open (and create) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, book_id: &str) -> Result<PathBuf> {
        Ok(self.dir.join(progress_file_name(book_id)?))
    }

    /// Take the per-book write lock. Released when the returned file drops.
    fn lock_book(&self, book_id: &str) -> Result<File> {
        // Book ids never start with '.', so lock files cannot collide with records
        let path = self.dir.join(format!(".{}.lock", book_id));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", path.display()))?;
        Ok(file)
    }

    fn read(&self, path: &Path) -> Result<Option<BookProgress>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", path.display()));
            }
        };

        let progress: BookProgress = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if !progress.is_consistent() {
            anyhow::bail!("Corrupt progress record in {}", path.display());
        }
        Ok(Some(progress))
    }
}

impl ProgressStore for JsonProgressStore {
    fn load_progress(&self, book_id: &str) -> Result<BookProgress> {
        let path = self.path_for(book_id)?;
        Ok(self.read(&path)?.unwrap_or_default())
    }

    fn save_progress(&self, book_id: &str, progress: &BookProgress) -> Result<BookProgress> {
        let path = self.path_for(book_id)?;
        let _lock = self.lock_book(book_id)?;

        let stored = self.read(&path)?;
        let merged = merge_for_write(book_id, stored.as_ref(), progress);

        let content =
            serde_json::to_string_pretty(&merged).context("Failed to serialize progress")?;
        let mut temp_file =
            NamedTempFile::new_in(&self.dir).context("Failed to create temp file")?;
        temp_file
            .write_all(content.as_bytes())
            .context("Failed to write progress JSON")?;
        temp_file
            .persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(merged)
    }
}

/// In-memory store, for tests and hosts with their own persistence.
#[derive(Default)]
pub struct MemoryProgressStore {
    records: Mutex<HashMap<String, BookProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load_progress(&self, book_id: &str) -> Result<BookProgress> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("Progress store lock poisoned"))?;
        Ok(records.get(book_id).cloned().unwrap_or_default())
    }

    fn save_progress(&self, book_id: &str, progress: &BookProgress) -> Result<BookProgress> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("Progress store lock poisoned"))?;
        let merged = merge_for_write(book_id, records.get(book_id), progress);
        records.insert(book_id.to_string(), merged.clone());
        Ok(merged)
    }
}
