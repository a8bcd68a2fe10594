//! Usage tracking across days and models.
//!
//! Each call is added to the bucket of its UTC day and to the running
//! total. Records are only ever added to; clearing is done from settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use pagemagic_common::keys::{usage_key, MODEL_LOOKUP_KEY, TOTAL_USAGE_KEY};
use pagemagic_common::{DailyUsage, StorageError, TotalUsage};
use pagemagic_storage::typed::{get_json, set_json};
use pagemagic_storage::KeyValueStore;
use tracing::debug;

use crate::models::ModelInfo;
use crate::TokenUsage;

#[derive(Clone)]
pub struct UsageTracker {
    store: Arc<dyn KeyValueStore>,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Record one API call for today (UTC).
    pub async fn record(&self, model: &str, usage: &TokenUsage, cost: f64) -> Result<(), StorageError> {
        self.record_on(Utc::now().date_naive(), model, usage, cost).await
    }

    pub async fn record_on(
        &self,
        date: NaiveDate,
        model: &str,
        usage: &TokenUsage,
        cost: f64,
    ) -> Result<(), StorageError> {
        let mut daily = self.daily(date).await?;
        let mut total = self.total().await?;

        daily.record(model, usage.prompt_tokens, usage.completion_tokens, cost);
        total.record(model, usage.prompt_tokens, usage.completion_tokens, cost);

        set_json(self.store.as_ref(), &usage_key(date), &daily).await?;
        set_json(self.store.as_ref(), TOTAL_USAGE_KEY, &total).await?;

        debug!(
            model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            cost,
            "usage recorded"
        );
        Ok(())
    }

    pub async fn daily(&self, date: NaiveDate) -> Result<DailyUsage, StorageError> {
        Ok(get_json(self.store.as_ref(), &usage_key(date))
            .await?
            .unwrap_or_default())
    }

    pub async fn today(&self) -> Result<DailyUsage, StorageError> {
        self.daily(Utc::now().date_naive()).await
    }

    pub async fn total(&self) -> Result<TotalUsage, StorageError> {
        Ok(get_json(self.store.as_ref(), TOTAL_USAGE_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Model id to display name, as cached by the last model listing.
    pub async fn model_lookup(&self) -> Result<BTreeMap<String, String>, StorageError> {
        Ok(get_json(self.store.as_ref(), MODEL_LOOKUP_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_model_lookup(&self, models: &[ModelInfo]) -> Result<(), StorageError> {
        let lookup: BTreeMap<&str, &str> = models
            .iter()
            .map(|m| (m.id.as_str(), m.display_name.as_str()))
            .collect();
        set_json(self.store.as_ref(), MODEL_LOOKUP_KEY, &lookup).await
    }
}
