//! The settings page: credentials, model choice, usage, storage upkeep.

mod report;


use std::sync::Arc;

use chrono::NaiveDate;
use pagemagic_ai::{CssService, ModelInfo};
use pagemagic_common::{all_disabled, ConfigError, PageMagicError, ScopeKey};
use pagemagic_config::{validate_api_key, Settings, SettingsStore};
use pagemagic_storage::stats::{
    clear_owned_keys, clear_scoped_data, clear_usage_data, collect_stats, list_sites, SiteSummary,
};
use pagemagic_storage::{Storage, StorageStats};
use tracing::{info, warn};

use crate::popup::Status;

pub use report::{format_cost, model_lines, ModelLine, UsageReport};

const TEST_HTML: &str = "<body><p>Test paragraph.</p></body>";
const TEST_PROMPT: &str = "make the paragraph text red";

/// Models offered for selection and the one to preselect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelChoice {
    pub models: Vec<ModelInfo>,
    pub selected: Option<String>,
}

pub struct SettingsController {
    storage: Storage,
    settings: SettingsStore,
    service: Arc<CssService>,
}

impl SettingsController {
    pub fn new(storage: Storage, service: Arc<CssService>) -> Self {
        Self {
            settings: SettingsStore::new(storage.sync.clone()),
            storage,
            service,
        }
    }

    pub async fn load_settings(&self) -> Result<Settings, PageMagicError> {
        Ok(self.settings.load().await?)
    }

    /// Fetch the free models for the stored key and cache their names.
    ///
    /// The saved model stays selected when it is offered, otherwise the
    /// first model is picked. Without a key nothing is fetched.
    pub async fn load_models(&self) -> Result<ModelChoice, PageMagicError> {
        let saved = self.settings.load().await?;
        if !saved.has_api_key() {
            return Ok(ModelChoice::default());
        }

        let models = self.service.get_available_models().await?;
        if let Err(e) = self.service.save_model_lookup(&models).await {
            warn!(error = %e, "failed to cache model names");
        }

        let selected = saved
            .selected_model
            .filter(|id| models.iter().any(|m| &m.id == id))
            .or_else(|| models.first().map(|m| m.id.clone()));
        info!(count = models.len(), selected = ?selected, "models loaded");
        Ok(ModelChoice { models, selected })
    }

    pub async fn save(&self, api_key: &str, model: &str) -> Status {
        match self.settings.save(api_key, model).await {
            Ok(()) => {
                self.service.initialize().await;
                Status::success("Settings saved successfully!")
            }
            Err(e) => {
                warn!(error = %e, "failed to save settings");
                Status::error(settings_error_message(&e))
            }
        }
    }

    pub async fn set_api_key(&self, api_key: &str) -> Status {
        match self.settings.set_api_key(api_key).await {
            Ok(()) => {
                self.service.initialize().await;
                Status::success("API key saved.")
            }
            Err(e) => {
                warn!(error = %e, "failed to save api key");
                Status::error(settings_error_message(&e))
            }
        }
    }

    pub async fn set_model(&self, model: &str) -> Status {
        if model.trim().is_empty() {
            return Status::error("Please select a model");
        }
        match self.settings.set_model(model).await {
            Ok(()) => Status::success(format!("Model set to {}.", model.trim())),
            Err(e) => {
                warn!(error = %e, "failed to save model");
                Status::error("Failed to save settings")
            }
        }
    }

    /// Try a candidate key and model against a fixed test page.
    ///
    /// The stored settings are put back afterwards whatever the outcome.
    pub async fn test_connection(&self, api_key: &str, model: &str) -> Status {
        if let Err(e) = validate_api_key(api_key) {
            return Status::error(settings_error_message(&PageMagicError::from(e)));
        }
        if model.trim().is_empty() {
            return Status::error("Please select a model");
        }

        let saved = match self.settings.load().await {
            Ok(saved) => saved,
            Err(e) => return Status::error(format!("Connection failed: {e}")),
        };

        let candidate = Settings {
            api_key: Some(api_key.trim().to_string()),
            selected_model: Some(model.trim().to_string()),
        };
        let outcome = match self.settings.restore(&candidate).await {
            Ok(()) => {
                self.service.initialize().await;
                self.service
                    .generate_css(TEST_HTML, TEST_PROMPT)
                    .await
                    .map_err(PageMagicError::from)
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = self.settings.restore(&saved).await {
            warn!(error = %e, "failed to restore settings after connection test");
        }
        self.service.initialize().await;

        match outcome {
            Ok(generation) if generation.css.to_lowercase().contains("red") => {
                info!(model = %generation.model, "connection test passed");
                Status::success("Connection successful!")
            }
            Ok(_) => Status::error(
                "Connection failed: Test failed: No valid CSS returned or CSS did not match prompt.",
            ),
            Err(e) => {
                warn!(error = %e, "connection test failed");
                Status::error(format!("Connection failed: {e}"))
            }
        }
    }

    pub async fn usage_report(&self, date: NaiveDate) -> Result<UsageReport, PageMagicError> {
        let usage = self.service.usage();
        Ok(UsageReport {
            date,
            daily: usage.daily(date).await?,
            total: usage.total().await?,
            lookup: usage.model_lookup().await?,
        })
    }

    pub async fn storage_stats(&self) -> Result<StorageStats, PageMagicError> {
        Ok(collect_stats(self.storage.local.as_ref()).await?)
    }

    pub async fn sites(&self) -> Result<Vec<SiteSummary>, PageMagicError> {
        Ok(list_sites(self.storage.local.as_ref()).await?)
    }

    /// Disable every change of a site, or enable them all when the site is
    /// already fully disabled.
    pub async fn toggle_site(&self, scope: &ScopeKey) -> Status {
        let repo = self.storage.history();
        let result = async {
            let mut entries = repo.load(scope).await?;
            if entries.is_empty() {
                return Ok(None);
            }
            let disable = !all_disabled(&entries);
            for entry in &mut entries {
                entry.disabled = disable;
            }
            repo.commit(scope, &entries).await?;
            Ok::<_, PageMagicError>(Some(disable))
        }
        .await;

        let url = scope.display_url();
        match result {
            Ok(Some(true)) => Status::success(format!("Disabled customizations for {url}")),
            Ok(Some(false)) => Status::success(format!("Enabled customizations for {url}")),
            Ok(None) => Status::error(format!("No customizations stored for {url}")),
            Err(e) => {
                warn!(scope = %scope, error = %e, "failed to toggle site");
                Status::error("Failed to toggle site status.")
            }
        }
    }

    pub async fn delete_site(&self, scope: &ScopeKey) -> Status {
        match self.storage.history().delete_scope(scope).await {
            Ok(()) => {
                info!(scope = %scope, "site customizations deleted");
                Status::success(format!("Deleted customizations for {}", scope.display_url()))
            }
            Err(e) => {
                warn!(scope = %scope, error = %e, "failed to delete site");
                Status::error("Failed to delete site customizations.")
            }
        }
    }

    pub async fn clear_css_data(&self) -> Status {
        match clear_scoped_data(self.storage.local.as_ref()).await {
            Ok(count) => Status::success(format!("Cleared {count} CSS/history items")),
            Err(e) => {
                warn!(error = %e, "failed to clear css data");
                Status::error("Error clearing CSS data")
            }
        }
    }

    pub async fn clear_usage_data(&self) -> Status {
        match clear_usage_data(self.storage.local.as_ref()).await {
            Ok(count) => Status::success(format!("Cleared {count} usage data items")),
            Err(e) => {
                warn!(error = %e, "failed to clear usage data");
                Status::error("Error clearing usage data")
            }
        }
    }

    /// Wipe the sync area and every PageMagic key in the local area.
    pub async fn factory_reset(&self) -> Status {
        let result = async {
            self.settings.clear().await?;
            clear_owned_keys(self.storage.local.as_ref()).await?;
            Ok::<_, PageMagicError>(())
        }
        .await;
        self.service.initialize().await;

        match result {
            Ok(()) => {
                info!("factory reset complete");
                Status::success("Factory reset complete. Please re-enter API key.")
            }
            Err(e) => {
                warn!(error = %e, "factory reset failed");
                Status::error("Error during factory reset")
            }
        }
    }
}

/// Status text for a rejected save.
fn settings_error_message(err: &PageMagicError) -> String {
    match err {
        PageMagicError::Config(ConfigError::InvalidApiKey(message)) => message.clone(),
        PageMagicError::Config(ConfigError::MissingModel) => "Please select a model".into(),
        _ => "Failed to save settings".into(),
    }
}
