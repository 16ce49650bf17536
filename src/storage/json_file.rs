//! JSON file-backed storage.
//!
//! Every write rewrites the whole file. The player persists on each clock
//! tick while playing (four times a second at the default 250 ms), so the
//! file is kept compact and small.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::KeyValueStorage;
use crate::error::AppResult;

/// Storage persisted as one JSON object of string slots.
#[derive(Debug)]
pub struct JsonFileStorage {
    file_path: PathBuf,
    /// In-memory cache for fast reads.
    cache: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Open (or start) a storage file.
    ///
    /// A file that exists but cannot be parsed is treated as empty and will be
    /// overwritten on the next write.
    pub fn new(file_path: impl AsRef<Path>) -> AppResult<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        let storage = Self {
            file_path,
            cache: RwLock::new(BTreeMap::new()),
        };

        storage.reload()?;
        Ok(storage)
    }

    /// Replace the cache with the file's current contents.
    pub fn reload(&self) -> AppResult<()> {
        if !self.file_path.exists() {
            tracing::info!(path = %self.file_path.display(), "Storage file not found, starting empty");
            self.cache.write().clear();
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.file_path)?;
        let slots: BTreeMap<String, String> = match serde_json::from_str(&content) {
            Ok(slots) => slots,
            Err(e) => {
                tracing::warn!(
                    path = %self.file_path.display(),
                    error = %e,
                    "Storage file is corrupt, starting empty"
                );
                BTreeMap::new()
            }
        };

        let mut cache = self.cache.write();
        *cache = slots;
        tracing::debug!(count = cache.len(), "Loaded storage slots from file");
        Ok(())
    }

    /// Write the cache to the file.
    fn save(&self, cache: &BTreeMap<String, String>) -> AppResult<()> {
        let content = serde_json::to_string(cache)?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write atomically using temp file
        let temp_path = self.file_path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, &self.file_path)?;

        tracing::trace!(path = %self.file_path.display(), count = cache.len(), "Saved storage file");
        Ok(())
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut cache = self.cache.write();
        let previous = cache.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save(&cache) {
            // Keep memory in line with what is on disk.
            match previous {
                Some(previous) => cache.insert(key.to_string(), previous),
                None => cache.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut cache = self.cache.write();
        if let Some(previous) = cache.remove(key) {
            if let Err(e) = self.save(&cache) {
                cache.insert(key.to_string(), previous);
                return Err(e);
            }
        }
        Ok(())
    }
}
