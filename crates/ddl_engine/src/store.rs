//! Persistent key-value storage and the link queue kept in it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use engine_logging::{engine_debug, engine_warn};

use crate::persist::{AtomicFileWriter, PersistError};

/// Namespaced key holding the queue.
pub const QUEUE_KEY: &str = "ddl_harvester.queue";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to persist store: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to read store {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to serialize store: {0}")]
    Serialize(String),
    #[error("stored value under {key} is malformed: {message}")]
    MalformedValue { key: String, message: String },
}

#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-process store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// All keys in a single RON map file, rewritten atomically on every `set`.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    // Serializes read-modify-write of the whole file within this process.
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    message: err.to_string(),
                });
            }
        };

        match ron::from_str(&content) {
            Ok(values) => Ok(values),
            Err(err) => {
                engine_warn!(
                    "Failed to parse store {:?}, treating it as empty: {}",
                    self.path,
                    err
                );
                Ok(BTreeMap::new())
            }
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut values = self.load()?;
        values.insert(key.to_string(), value);

        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&values, pretty)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        AtomicFileWriter::new(&self.path)?.write(&content)?;
        engine_debug!("Store {:?} updated key {}", self.path, key);
        Ok(())
    }
}

/// The persisted, ordered list of resolved links.
#[derive(Clone)]
pub struct QueueStore {
    store: Arc<dyn KeyValueStore>,
}

impl QueueStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current queue; empty when never set.
    pub async fn get(&self) -> Result<Vec<String>, StoreError> {
        let Some(raw) = self.store.get(QUEUE_KEY).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|err| StoreError::MalformedValue {
            key: QUEUE_KEY.to_string(),
            message: err.to_string(),
        })
    }

    /// Replaces the whole queue.
    pub async fn set(&self, queue: &[String]) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(queue).map_err(|err| StoreError::Serialize(err.to_string()))?;
        self.store.set(QUEUE_KEY, raw).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.set(&[]).await
    }
}
