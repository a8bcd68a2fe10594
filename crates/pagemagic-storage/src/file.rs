//! JSON-file store.
//!
//! The whole area is one JSON object on disk, loaded once on open and
//! rewritten after every mutation. Writes go to a sibling temp file that is
//! then renamed over the original; the in-memory map only changes once the
//! write has succeeded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pagemagic_common::StorageError;
use tokio::sync::Mutex;

use crate::KeyValueStore;

pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, serde_json::Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = read_store_file(&path).await?;
        tracing::debug!(path = %path.display(), keys = entries.len(), "loaded store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, serde_json::Value>) -> Result<(), StorageError> {
        write_store_file(&self.path, entries).await
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        if !keys.iter().any(|key| entries.contains_key(key)) {
            return Ok(());
        }
        let mut next = entries.clone();
        for key in keys {
            next.remove(key);
        }
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn snapshot(&self) -> Result<BTreeMap<String, serde_json::Value>, StorageError> {
        Ok(self.entries.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        let next = BTreeMap::new();
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}

async fn read_store_file(path: &Path) -> Result<BTreeMap<String, serde_json::Value>, StorageError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(StorageError::Read(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&content).map_err(|e| StorageError::Decode {
        key: path.display().to_string(),
        message: e.to_string(),
    })
}

async fn write_store_file(
    path: &Path,
    entries: &BTreeMap<String, serde_json::Value>,
) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::Write(format!(
                "failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let encoded = serde_json::to_vec_pretty(entries).map_err(|e| StorageError::Encode {
        key: path.display().to_string(),
        message: e.to_string(),
    })?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, encoded)
        .await
        .map_err(|e| StorageError::Write(format!("failed to write {}: {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        StorageError::Write(format!(
            "failed to replace {}: {e}",
            path.display()
        ))
    })
}
