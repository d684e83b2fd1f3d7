//! # Storage Module
//!
//! Durable key/value slots for the inventory. Each slot holds one JSON
//! document. `FileStorage` keeps one file per slot in a data directory;
//! `MemoryStorage` backs tests.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// A store of named JSON slots
pub trait StorageBackend: Send {
    /// Read a slot; `Ok(None)` when it was never written
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the slot contents
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per slot under a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) the storage directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        info!(data_dir = %dir.display(), "Opened file storage");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            debug!(slot = %key, "Storage slot not present");
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage slot {}", path.display()))?;
        Ok(Some(contents))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key);

        // Write next to the target so the rename stays on one filesystem
        let mut temp_file = NamedTempFile::new_in(&self.dir)
            .context("Failed to create temporary storage file")?;
        temp_file
            .write_all(value.as_bytes())
            .context("Failed to write storage slot")?;
        temp_file
            .persist(&path)
            .with_context(|| format!("Failed to replace storage slot {}", path.display()))?;

        debug!(slot = %key, bytes = value.len(), "Storage slot written");
        Ok(())
    }
}

/// In-memory slots; clones share the same map so tests can inspect writes
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw slot contents, for assertions
    pub fn get(&self, key: &str) -> Option<String> {
        self.slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(key).cloned())
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_missing_slot() -> Result<()> {
        let dir = TempDir::new()?;
        let storage = FileStorage::open(dir.path())?;
        assert_eq!(storage.load("nothing")?, None);
        Ok(())
    }

    #[test]
    fn test_file_storage_overwrites_slot() -> Result<()> {
        let dir = TempDir::new()?;
        let mut storage = FileStorage::open(dir.path().join("nested"))?;

        storage.save("slot", "[1]")?;
        storage.save("slot", "[1,2]")?;

        assert_eq!(storage.load("slot")?.as_deref(), Some("[1,2]"));
        assert!(dir.path().join("nested").join("slot.json").exists());
        Ok(())
    }

    #[test]
    fn test_memory_storage_clones_share_slots() -> Result<()> {
        let storage = MemoryStorage::new();
        let mut writer = storage.clone();
        writer.save("k", "v")?;
        assert_eq!(storage.get("k").as_deref(), Some("v"));
        Ok(())
    }
}
