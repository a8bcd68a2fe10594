//! User settings stored in the sync area: the OpenRouter API key and the
//! selected model id.

use std::fmt;
use std::sync::Arc;

use pagemagic_common::keys::{API_KEY_KEY, SELECTED_MODEL_KEY};
use pagemagic_common::{ConfigError, PageMagicError, StorageError};
use pagemagic_storage::typed::{get_json, remove_key, set_json};
use pagemagic_storage::KeyValueStore;
use tracing::info;

/// Every OpenRouter key starts with this.
pub const API_KEY_PREFIX: &str = "sk-or-";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub selected_model: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("selected_model", &self.selected_model)
            .finish()
    }
}

impl Settings {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Key and model, or the error naming whichever is missing first.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let model = self
            .selected_model
            .as_deref()
            .filter(|m| !m.is_empty())
            .ok_or(ConfigError::MissingModel)?;
        Ok((key, model))
    }

    /// Key with its middle hidden, for display.
    pub fn masked_api_key(&self) -> Option<String> {
        let key = self.api_key.as_deref()?;
        if key.len() <= 10 || !key.is_ascii() {
            return Some("*".repeat(key.chars().count()));
        }
        Some(format!("{}...{}", &key[..6], &key[key.len() - 4..]))
    }
}

/// Reject keys that are blank or lack the OpenRouter prefix.
pub fn validate_api_key(key: &str) -> Result<(), ConfigError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidApiKey("Please enter an API key".into()));
    }
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(ConfigError::InvalidApiKey(format!(
            "OpenRouter API key should start with {API_KEY_PREFIX}"
        )));
    }
    Ok(())
}

/// Reads and writes [`Settings`] in the sync storage area.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<Settings, StorageError> {
        Ok(Settings {
            api_key: get_json(self.store.as_ref(), API_KEY_KEY).await?,
            selected_model: get_json(self.store.as_ref(), SELECTED_MODEL_KEY).await?,
        })
    }

    /// Validate and persist both values.
    pub async fn save(&self, api_key: &str, model: &str) -> Result<(), PageMagicError> {
        validate_api_key(api_key)?;
        if model.trim().is_empty() {
            return Err(ConfigError::MissingModel.into());
        }
        self.set_api_key(api_key).await?;
        self.set_model(model).await?;
        Ok(())
    }

    pub async fn set_api_key(&self, api_key: &str) -> Result<(), PageMagicError> {
        validate_api_key(api_key)?;
        set_json(self.store.as_ref(), API_KEY_KEY, api_key.trim()).await?;
        info!("api key saved");
        Ok(())
    }

    pub async fn set_model(&self, model: &str) -> Result<(), StorageError> {
        set_json(self.store.as_ref(), SELECTED_MODEL_KEY, model.trim()).await?;
        info!(model = model.trim(), "model selected");
        Ok(())
    }

    /// Restore a previous snapshot exactly, removing keys that were unset.
    pub async fn restore(&self, settings: &Settings) -> Result<(), StorageError> {
        match &settings.api_key {
            Some(key) => set_json(self.store.as_ref(), API_KEY_KEY, key).await?,
            None => remove_key(self.store.as_ref(), API_KEY_KEY).await?,
        }
        match &settings.selected_model {
            Some(model) => set_json(self.store.as_ref(), SELECTED_MODEL_KEY, model).await?,
            None => remove_key(self.store.as_ref(), SELECTED_MODEL_KEY).await?,
        }
        Ok(())
    }

    /// Drop everything in the sync area.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemagic_storage::MemoryStore;

    fn store() -> SettingsStore {
        SettingsStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn api_key_prefix_is_enforced() {
        assert!(validate_api_key("sk-or-v1-abc").is_ok());
        assert!(validate_api_key("  sk-or-v1-abc  ").is_ok());

        let err = validate_api_key("sk-abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid API key: OpenRouter API key should start with sk-or-"
        );
        assert!(matches!(validate_api_key(""), Err(ConfigError::InvalidApiKey(_))));
    }

    #[test]
    fn credentials_report_missing_key_first() {
        let settings = Settings::default();
        assert!(matches!(settings.credentials(), Err(ConfigError::MissingApiKey)));

        let settings = Settings {
            api_key: Some("sk-or-x".into()),
            selected_model: Some(String::new()),
        };
        assert!(matches!(settings.credentials(), Err(ConfigError::MissingModel)));

        let settings = Settings {
            api_key: Some("sk-or-x".into()),
            selected_model: Some("m/free".into()),
        };
        assert_eq!(settings.credentials().unwrap(), ("sk-or-x", "m/free"));
    }

    #[test]
    fn debug_redacts_key() {
        let settings = Settings {
            api_key: Some("sk-or-secret-value".into()),
            selected_model: None,
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(settings.masked_api_key().unwrap(), "sk-or-...alue");
    }

    #[tokio::test]
    async fn save_load_restore() {
        let store = store();
        assert_eq!(store.load().await.unwrap(), Settings::default());

        store.save("sk-or-v1-key", "meta/llama:free").await.unwrap();
        let saved = store.load().await.unwrap();
        assert_eq!(saved.api_key.as_deref(), Some("sk-or-v1-key"));
        assert_eq!(saved.selected_model.as_deref(), Some("meta/llama:free"));

        store.set_model("other").await.unwrap();
        store.restore(&saved).await.unwrap();
        assert_eq!(store.load().await.unwrap(), saved);

        store.restore(&Settings::default()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn save_rejects_bad_key_without_writing() {
        let store = store();
        assert!(store.save("bad-key", "m").await.is_err());
        assert!(store.save("sk-or-ok", " ").await.is_err());
        assert_eq!(store.load().await.unwrap(), Settings::default());
    }
}
