//! Typed read/write helpers over a raw [`KeyValueStore`].

use pagemagic_common::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::KeyValueStore;

/// Read and decode `key`. Missing keys are `Ok(None)`.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key).await? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Decode {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

/// Encode and write `value` under `key`.
pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let encoded = serde_json::to_value(value).map_err(|e| StorageError::Encode {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, encoded).await
}

pub async fn remove_key(store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
    store.remove(&[key.to_string()]).await
}
