//! File-backed store: one JSON object per preference file.
//!
//! The whole map is loaded when the store is opened and rewritten on every
//! change. Writes are atomic:
//!
//! 1. Serialize the map to a temporary file next to the target
//! 2. `fsync` the temporary file
//! 3. Rename it over the target
//! 4. `fsync` the parent directory (Unix only)
//!
//! Readers of the file therefore see either the old or the new map. A
//! temporary file whose write or rename failed is deleted.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{PrefsError, PrefsResult};

use super::{BackingStore, ObserverList, StoreObserver};

/// [`BackingStore`] persisted as a JSON file.
#[derive(Debug)]
pub struct FileBackingStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
    observers: ObserverList,
}

impl FileBackingStore {
    /// Opens the store at `path`, creating parent directories as needed.
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::Io`] if the file or directory cannot be accessed,
    /// and [`PrefsError::Backing`] if the file is not a JSON object of strings.
    pub fn open<P: AsRef<Path>>(path: P) -> PrefsResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                PrefsError::io(
                    format!("creating preference directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                PrefsError::backing(format!(
                    "preference file '{}' is not a JSON string map: {e}",
                    path.display()
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(PrefsError::io(
                    format!("reading preference file '{}'", path.display()),
                    e,
                ))
            }
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened preference file");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            observers: ObserverList::default(),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Creates the temporary file in the target's directory, so the final
    /// rename never crosses file systems. It is deleted when dropped.
    fn temp_file(&self) -> PrefsResult<NamedTempFile> {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "prefs".into(), |n| n.to_string_lossy().into_owned());
        tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(self.directory())
            .map_err(|e| {
                PrefsError::io(
                    format!("creating temporary file in '{}'", self.directory().display()),
                    e,
                )
            })
    }

    fn read(&self) -> PrefsResult<RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .read()
            .map_err(|e| PrefsError::backing(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> PrefsResult<RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .write()
            .map_err(|e| PrefsError::backing(format!("lock poisoned: {e}")))
    }

    /// Applies `change` and persists the result. The in-memory map is only
    /// updated once the file has been replaced.
    fn mutate<F>(&self, change: F) -> PrefsResult<bool>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut entries = self.write()?;
        let mut updated = entries.clone();
        if !change(&mut updated) {
            return Ok(false);
        }
        self.persist(&updated)?;
        *entries = updated;
        drop(entries);
        Ok(true)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> PrefsResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| PrefsError::backing(format!("serializing preferences: {e}")))?;
        let mut temp = self.temp_file()?;
        let temp_path = temp.path().to_path_buf();

        temp.write_all(&bytes)
            .map_err(|e| PrefsError::io(format!("writing '{}'", temp_path.display()), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| PrefsError::io(format!("syncing '{}'", temp_path.display()), e))?;

        temp.persist(&self.path).map_err(|e| {
            PrefsError::io(
                format!("renaming '{}' to '{}'", temp_path.display(), self.path.display()),
                e.error,
            )
        })?;
        self.sync_directory()
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> PrefsResult<()> {
        let dir = self.directory();
        File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(|e| PrefsError::io(format!("syncing directory '{}'", dir.display()), e))
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    fn sync_directory(&self) -> PrefsResult<()> {
        Ok(())
    }
}

impl BackingStore for FileBackingStore {
    fn get_string(&self, key: &str) -> PrefsResult<Option<String>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> PrefsResult<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })?;
        self.observers.notify(key);
        Ok(())
    }

    fn contains(&self, key: &str) -> PrefsResult<bool> {
        Ok(self.read()?.contains_key(key))
    }

    fn remove(&self, key: &str) -> PrefsResult<()> {
        if self.mutate(|entries| entries.remove(key).is_some())? {
            self.observers.notify(key);
        }
        Ok(())
    }

    fn clear(&self) -> PrefsResult<()> {
        self.mutate(|entries| {
            entries.clear();
            true
        })?;
        Ok(())
    }

    fn keys(&self) -> PrefsResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn register_observer(&self, observer: &Arc<dyn StoreObserver>) {
        self.observers.add(observer);
    }
}
