//! Record file persistence
//!
//! Handles reading and writing record files in a single flat directory.
//! Uses atomic writes (write to temp file, then rename) to prevent corruption.
//!
//! Storage location: `~/.local/share/quire/blog/` (configurable via `Config`)
//!
//! Files:
//! - `<slug>.mdx` - one record per slug
//! - `.<slug>.mdx.tmp` - transient, only while a write is in flight

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// File extension of record files
pub const RECORD_EXTENSION: &str = "mdx";

/// Raw access to record files, keyed by slug
///
/// The store only talks to this trait, so the flat directory can be swapped
/// for another backend (or a failure-injecting double in tests).
pub trait RecordPersistence {
    /// Slugs of every record file, sorted
    fn list_slugs(&self) -> StoreResult<Vec<String>>;

    /// Check whether a record file exists
    fn exists(&self, slug: &str) -> bool;

    /// Read the raw text of a record; `None` if it does not exist
    fn read(&self, slug: &str) -> StoreResult<Option<String>>;

    /// Replace (or create) the whole record file atomically
    fn write(&self, slug: &str, content: &str) -> StoreResult<()>;

    /// Remove a record file; returns `false` if it did not exist
    fn remove(&self, slug: &str) -> StoreResult<bool>;

    /// Location of a record, for diagnostics
    fn locate(&self, slug: &str) -> PathBuf;
}

/// Flat-directory persistence: one `<slug>.mdx` file per record
#[derive(Debug, Clone)]
pub struct FsPersistence {
    dir: PathBuf,
}

impl FsPersistence {
    /// Create a persistence handler rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the record files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the content directory if it is missing
    pub fn ensure_dir(&self) -> StoreResult<()> {
        ensure_dir(&self.dir)
    }

    fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", slug, RECORD_EXTENSION))
    }
}

impl RecordPersistence for FsPersistence {
    fn list_slugs(&self) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::from_read(e, self.dir.clone())),
        };

        let mut slugs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::from_read(e, self.dir.clone()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().map_or(true, |ext| ext != RECORD_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if !stem.starts_with('.') => slugs.push(stem.to_string()),
                _ => debug!(path = %path.display(), "ignoring non-record file"),
            }
        }

        slugs.sort();
        Ok(slugs)
    }

    fn exists(&self, slug: &str) -> bool {
        self.path_for(slug).is_file()
    }

    fn read(&self, slug: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(slug);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::from_read(e, path)),
        }
    }

    fn write(&self, slug: &str, content: &str) -> StoreResult<()> {
        atomic_write(&self.path_for(slug), content.as_bytes())
    }

    fn remove(&self, slug: &str) -> StoreResult<bool> {
        let path = self.path_for(slug);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::from_io(e, path)),
        }
    }

    fn locate(&self, slug: &str) -> PathBuf {
        self.path_for(slug)
    }
}

/// Create a directory (and parents) with a typed error
pub(crate) fn ensure_dir(dir: &Path) -> StoreResult<()> {
    fs::create_dir_all(dir).map_err(|source| StoreError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write data to a file atomically
///
/// 1. Write to a hidden temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let written = write_synced(&temp_path, data);
    if let Err(source) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::from_io(source, temp_path));
    }

    if let Err(source) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::AtomicWriteFailed {
            from: temp_path,
            to: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
