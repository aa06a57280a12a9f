use std::{
    fs,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use serde_json::{Map, Value};

use taaza_logic::{LocationStore, prelude::*};

/// Durable key-value store backed by a single JSON object file, the desktop
/// counterpart of the mobile shell's preference store. Writes land in a temp
/// file first and are renamed into place, so a crash mid-write never leaves
/// a torn file behind.
pub struct JsonFileStore {
    path: PathBuf,
    // One lock for the whole read-modify-write cycle, the manager owns its
    // keys exclusively so contention is not a concern
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path).context("Failed to read store file")?;
        serde_json::from_str(&raw).context("Store file is not a JSON object")
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        let raw = serde_json::to_string_pretty(entries).context("Failed to encode store")?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, raw).context("Failed to write store file")?;
        fs::rename(&staging, &self.path).context("Failed to move store file into place")?;
        Ok(())
    }
}

impl LocationStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = self.read_entries()?;
        Ok(entries
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), Value::String(value));
        self.write_entries(&entries)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        for key in keys {
            entries.remove(*key);
        }
        self.write_entries(&entries)
    }
}
