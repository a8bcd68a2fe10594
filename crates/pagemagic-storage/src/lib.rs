//! Persistent key-value storage for PageMagic.
//!
//! Two areas mirror the browser's storage model:
//! - **sync**: user settings (API key, selected model)
//! - **local**: history, applied CSS, usage records, preferences
//!
//! Both are [`KeyValueStore`] trait objects holding JSON values, so the
//! same code runs against the in-memory store in tests and the JSON file
//! store on disk. Typed repositories on top of the raw stores own the key
//! layout for history, applied CSS and preferences.

pub mod file;
pub mod history;
pub mod memory;
pub mod preferences;
pub mod stats;
pub mod typed;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use pagemagic_common::StorageError;

pub use file::JsonFileStore;
pub use history::HistoryRepo;
pub use memory::MemoryStore;
pub use preferences::{Preferences, TabState};
pub use stats::{format_size, StorageStats};

/// A flat map of string keys to JSON values.
///
/// Writes are last-write-wins; there are no transactions.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError>;

    /// Every stored key and value.
    async fn snapshot(&self) -> Result<BTreeMap<String, serde_json::Value>, StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}

/// The two storage areas used by the extension.
#[derive(Clone)]
pub struct Storage {
    pub sync: Arc<dyn KeyValueStore>,
    pub local: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(sync: Arc<dyn KeyValueStore>, local: Arc<dyn KeyValueStore>) -> Self {
        Self { sync, local }
    }

    /// Volatile storage, used by tests and dry runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// File-backed storage: `sync.json` and `local.json` inside `dir`.
    pub async fn open_dir(dir: &Path) -> Result<Self, StorageError> {
        let sync = JsonFileStore::open(dir.join("sync.json")).await?;
        let local = JsonFileStore::open(dir.join("local.json")).await?;
        tracing::debug!(dir = %dir.display(), "storage opened");
        Ok(Self::new(Arc::new(sync), Arc::new(local)))
    }

    pub fn history(&self) -> HistoryRepo {
        HistoryRepo::new(self.local.clone())
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.local.clone())
    }
}
