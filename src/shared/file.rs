//! File-backed shared store
//!
//! Lets separate OS processes share a roster. Each key is one JSON file in a
//! directory:
//!
//! ```text
//! {dir}/
//! ├── windows.json
//! └── ...
//! ```
//!
//! Writes go to a temporary file in the same directory and are renamed into
//! place, so readers in other processes see either the old or the new value.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecursiveMode, Watcher};
use parking_lot::Mutex;
use tempfile::NamedTempFile;

use super::backend::{ChangeListener, StorageBackend, Subscription};
use super::error::StoreError;

/// Shared store kept in a directory on disk
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    /// Last value this handle wrote per key (`None` after a remove), used to
    /// filter our own writes out of change notifications
    last_written: Arc<Mutex<HashMap<String, Option<String>>>>,
}

impl FileBackend {
    /// Open (creating if needed) a store in `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        fs::create_dir_all(dir.as_ref())?;
        let dir = fs::canonicalize(dir.as_ref())?;

        tracing::debug!(dir = %dir.display(), "File store opened");

        Ok(Self {
            dir,
            last_written: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Directory holding the key files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a key
    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Keep keys usable as file names
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Read a key file; bytes that are not UTF-8 are bad data, not an I/O failure
fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8(bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        read_optional(&self.key_path(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key);

        // Record before the rename lands so the watcher recognizes our own write
        self.last_written
            .lock()
            .insert(key.to_string(), Some(value.to_string()));

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_data()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.last_written.lock().insert(key.to_string(), None);

        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self, key: &str, listener: ChangeListener) -> Result<Subscription, StoreError> {
        let path = self.key_path(key);
        let key = key.to_string();
        let last_written = Arc::clone(&self.last_written);

        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "File store watch error");
                        return;
                    }
                };

                if event.kind.is_access() || !event.paths.iter().any(|p| p == &path) {
                    return;
                }

                let current = match read_optional(&path) {
                    Ok(current) => current,
                    Err(_) => return,
                };
                if last_written.lock().get(&key) == Some(&current) {
                    return;
                }

                listener();
            },
        )
        .map_err(|e| io::Error::other(e.to_string()))?;

        watcher
            .watch(&self.dir, RecursiveMode::NonRecursive)
            .map_err(|e| io::Error::other(e.to_string()))?;

        Ok(Subscription::new(move || drop(watcher)))
    }
}
