// JSON file backing for device-local state
use crate::application::local_state::LocalStateStore;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// All keys live in one JSON object on disk; every write rewrites the file.
pub struct JsonFileState {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileState {
    /// A missing file starts empty; an unreadable one is logged and ignored
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Ignoring local state file {}: {:#}", path.display(), e);
                BTreeMap::new()
            }
        };
        tracing::debug!("Loaded {} local state entries from {}", entries.len(), path.display());

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path).context("Failed to read local state")?;
    serde_json::from_str(&content).context("Failed to parse local state")
}

impl LocalStateStore for JsonFileState {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    /// Memory is only updated once the file write succeeds
    fn store(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.write_entries(&next)?;
        *entries = next;
        Ok(())
    }
}
