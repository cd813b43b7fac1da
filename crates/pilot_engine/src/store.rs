use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pilot_core::{DurableStore, StoreError};
use pilot_logging::{pilot_info, pilot_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

const STORE_FILENAME: &str = ".pilot_store.ron";

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("store directory missing or not writable: {0}")]
    Directory(#[from] io::Error),
    #[error("store path is not a directory: {0:?}")]
    NotADirectory(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedStore {
    entries: BTreeMap<String, String>,
}

/// Durable key/value store kept in a single RON file.
///
/// Every `set`/`remove` rewrites the whole file through a temp file and a
/// rename, so a crash leaves either the old or the new map on disk.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store in `dir`, creating the directory if needed. A missing or
    /// unreadable store file starts an empty store.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let dir = dir.into();
        if dir.exists() {
            if !fs::metadata(&dir)?.is_dir() {
                return Err(FileStoreError::NotADirectory(dir));
            }
        } else {
            fs::create_dir_all(&dir)?;
        }

        let entries = load_entries(&dir.join(STORE_FILENAME));
        Ok(Self { dir, entries })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILENAME)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let state = PersistedStore {
            entries: self.entries.clone(),
        };
        let content = ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new())
            .map_err(|err| StoreError::Write(err.to_string()))?;
        write_atomically(&self.dir, &self.path(), &content)
            .map_err(|err| StoreError::Write(err.to_string()))
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush()
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(err) => {
            pilot_warn!("Failed to read store from {:?}: {}", path, err);
            return BTreeMap::new();
        }
    };

    match ron::from_str::<PersistedStore>(&content) {
        Ok(state) => {
            pilot_info!("Loaded {} store record(s) from {:?}", state.entries.len(), path);
            state.entries
        }
        Err(err) => {
            pilot_warn!("Failed to parse store from {:?}: {}", path, err);
            BTreeMap::new()
        }
    }
}

fn write_atomically(dir: &Path, target: &Path, content: &str) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|err| err.error)?;
    Ok(())
}
