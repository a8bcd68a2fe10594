//! Usage records: per-day and all-time request/cost aggregates per model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenCounts {
    pub prompt: u64,
    pub completion: u64,
}

/// Aggregate for a single model id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelUsage {
    pub requests: u64,
    pub cost: f64,
    pub tokens: TokenCounts,
}

impl ModelUsage {
    fn add(&mut self, prompt_tokens: u64, completion_tokens: u64, cost: f64) {
        self.requests += 1;
        self.cost += cost;
        self.tokens.prompt += prompt_tokens;
        self.tokens.completion += completion_tokens;
    }
}

/// Usage for one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DailyUsage {
    pub requests: u64,
    pub total_cost: f64,
    pub models: BTreeMap<String, ModelUsage>,
}

impl DailyUsage {
    pub fn record(&mut self, model: &str, prompt_tokens: u64, completion_tokens: u64, cost: f64) {
        self.requests += 1;
        self.total_cost += cost;
        self.models
            .entry(model.to_string())
            .or_default()
            .add(prompt_tokens, completion_tokens, cost);
    }
}

/// All-time usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TotalUsage {
    pub total_requests: u64,
    pub total_cost: f64,
    pub models: BTreeMap<String, ModelUsage>,
}

impl TotalUsage {
    pub fn record(&mut self, model: &str, prompt_tokens: u64, completion_tokens: u64, cost: f64) {
        self.total_requests += 1;
        self.total_cost += cost;
        self.models
            .entry(model.to_string())
            .or_default()
            .add(prompt_tokens, completion_tokens, cost);
    }

    pub fn has_data(&self) -> bool {
        self.total_requests > 0 || !self.models.is_empty()
    }
}
