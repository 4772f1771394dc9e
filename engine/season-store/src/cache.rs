//! # Table Cache
//!
//! In-memory cache of parsed tables keyed by file path. Every lookup
//! re-stats the file: an entry is reused only while the file's modification
//! time is unchanged, and dropped as soon as the file disappears.

use crate::error::{Result, StoreError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug)]
struct CacheEntry<T> {
    modified: SystemTime,
    table: Arc<T>,
}

/// Cache of parsed tables keyed by (path, mtime)
#[derive(Debug)]
pub struct TableCache<T> {
    entries: Mutex<HashMap<PathBuf, CacheEntry<T>>>,
}

impl<T> TableCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Return the cached table for `path`, reloading through `load` when the
    /// file changed since it was cached.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> Result<Arc<T>>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let modified = match std::fs::metadata(path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.invalidate(path);
                return Err(StoreError::MissingFile { path: path.to_path_buf() });
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(entry) = self.entries.lock().get(path) {
            if entry.modified == modified {
                debug!("Table cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.table));
            }
        }

        debug!("Table cache miss for {}", path.display());
        let table = Arc::new(load(path)?);
        self.entries
            .lock()
            .insert(path.to_path_buf(), CacheEntry { modified, table: Arc::clone(&table) });
        Ok(table)
    }

    /// Drop the entry for one path
    pub fn invalidate(&self, path: &Path) {
        self.entries.lock().remove(path);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached tables
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T> Default for TableCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
