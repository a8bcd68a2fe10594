//! The CSS generation service used by the popup and settings page.

use async_trait::async_trait;
use pagemagic_common::{ConfigError, StorageError};
use pagemagic_config::SettingsStore;
use pagemagic_storage::Storage;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::ModelInfo;
use crate::openrouter::{Credentials, OpenRouterClient};
use crate::usage::UsageTracker;
use crate::{AiError, CssGeneration, CssGenerator, TokenUsage};

/// Reads settings from storage, calls OpenRouter, records usage.
pub struct CssService {
    client: OpenRouterClient,
    settings: SettingsStore,
    usage: UsageTracker,
    api_key: RwLock<Option<String>>,
}

impl CssService {
    pub fn new(client: OpenRouterClient, storage: &Storage) -> Self {
        Self {
            client,
            settings: SettingsStore::new(storage.sync.clone()),
            usage: UsageTracker::new(storage.local.clone()),
            api_key: RwLock::new(None),
        }
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Load the API key from settings. Returns `false` when none is stored.
    pub async fn initialize(&self) -> bool {
        let key = match self.settings.load().await {
            Ok(settings) => settings.api_key.filter(|k| !k.is_empty()),
            Err(e) => {
                warn!(error = %e, "failed to read settings");
                None
            }
        };

        let found = key.is_some();
        if !found {
            warn!("OpenRouter API key not found in storage");
        }
        *self.api_key.write().await = key;
        found
    }

    /// Cached key, re-reading settings once when there is none.
    async fn api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.read().await.clone() {
            return Some(key);
        }
        if self.initialize().await {
            self.api_key.read().await.clone()
        } else {
            None
        }
    }

    async fn selected_model(&self) -> Result<String, AiError> {
        self.settings
            .load()
            .await?
            .selected_model
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ConfigError::MissingModel.into())
    }

    pub async fn generate_css(&self, html: &str, prompt: &str) -> Result<CssGeneration, AiError> {
        let api_key = self.api_key().await.ok_or(ConfigError::MissingApiKey)?;
        let model = self.selected_model().await?;
        let creds = Credentials::new(api_key, model);

        let completion = self.client.complete(&creds, html, prompt).await?;
        let css = completion.css();

        self.track_usage(&creds.model, &completion.usage, completion.cost)
            .await;
        info!(model = %creds.model, css_len = css.len(), "css generated");

        Ok(CssGeneration {
            css,
            model: creds.model,
            usage: completion.usage,
            cost: completion.cost,
        })
    }

    /// Free models for the stored key; empty without a key.
    pub async fn get_available_models(&self) -> Result<Vec<ModelInfo>, AiError> {
        match self.api_key().await {
            Some(key) => self.client.list_models(&key).await,
            None => {
                warn!("cannot fetch models without API key");
                Ok(Vec::new())
            }
        }
    }

    /// Record usage; failures are logged only.
    pub async fn track_usage(&self, model: &str, usage: &TokenUsage, cost: f64) {
        if let Err(e) = self.usage.record(model, usage, cost).await {
            warn!(error = %e, "failed to track usage");
        }
    }

    pub async fn save_model_lookup(&self, models: &[ModelInfo]) -> Result<(), StorageError> {
        self.usage.save_model_lookup(models).await
    }
}

#[async_trait]
impl CssGenerator for CssService {
    async fn generate_css(&self, html: &str, prompt: &str) -> Result<CssGeneration, AiError> {
        CssService::generate_css(self, html, prompt).await
    }
}

#[cfg(test)]
mod tests;
