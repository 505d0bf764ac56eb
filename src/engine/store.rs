use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::warn;

use crate::{DurableStore, Record, Result};

/// Disk-backed [`DurableStore`] keeping one `.json` file per store key.
///
/// Saves use an atomic "write-then-rename" strategy so a crash mid-write
/// leaves either the old file or the new file, never a torn one. Loads are
/// fail-open: a missing file, an unreadable file, or malformed JSON all yield
/// an empty collection with a logged warning.
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Initializes a new `FileStore` in the specified directory.
    ///
    /// If the directory does not exist, it will be created.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { data_dir: dir })
    }

    /// Lists the store keys that currently have a file on disk, sorted.
    pub fn keys(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("could not scan data dir {:?}: {}", self.data_dir, e);
                return Vec::new();
            }
        };

        let mut keys: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        keys.sort();
        keys
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

impl DurableStore for FileStore {
    fn load(&self, key: &str) -> Vec<Record> {
        let path = self.file_path(key);

        let content = match fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("could not read collection file {:?}: {}", path, e);
                return Vec::new();
            }
        };

        match serde_json::from_slice(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!("could not parse collection at {:?}: {}", path, e);
                Vec::new()
            }
        }
    }

    fn save(&self, key: &str, records: &[Record]) -> Result<()> {
        let file_path = self.file_path(key);
        let temp_path = file_path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(records)?;

        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &file_path)?;

        Ok(())
    }
}

/// Ephemeral in-memory [`DurableStore`] used by tests and embedders that do
/// not need data to outlive the process.
pub struct MemStore {
    data: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Lists the store keys that currently hold a collection, sorted.
    pub fn keys(&self) -> Vec<String> {
        let data = self.data.read().unwrap();
        let mut keys: Vec<String> = data.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStore for MemStore {
    fn load(&self, key: &str) -> Vec<Record> {
        let data = self.data.read().unwrap();
        data.get(key).cloned().unwrap_or_default()
    }

    fn save(&self, key: &str, records: &[Record]) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.insert(key.to_string(), records.to_vec());
        Ok(())
    }
}
