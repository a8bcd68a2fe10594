//! Usage report shown on the settings page.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pagemagic_common::{DailyUsage, ModelUsage, TotalUsage};

/// One model's share of a usage bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelLine {
    pub name: String,
    pub requests: u64,
    pub cost: f64,
}

impl ModelLine {
    pub fn render(&self) -> String {
        format!("{}: {} ({} req)", self.name, format_cost(self.cost), self.requests)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageReport {
    pub date: NaiveDate,
    pub daily: DailyUsage,
    pub total: TotalUsage,
    /// Model id to display name.
    pub lookup: BTreeMap<String, String>,
}

impl UsageReport {
    pub fn daily_lines(&self) -> Vec<ModelLine> {
        model_lines(&self.daily.models, &self.lookup)
    }

    pub fn total_lines(&self) -> Vec<ModelLine> {
        model_lines(&self.total.models, &self.lookup)
    }
}

/// Per-model lines sorted by display name; ids missing from `lookup` show
/// as themselves.
pub fn model_lines(
    models: &BTreeMap<String, ModelUsage>,
    lookup: &BTreeMap<String, String>,
) -> Vec<ModelLine> {
    let mut lines: Vec<ModelLine> = models
        .iter()
        .map(|(id, usage)| ModelLine {
            name: lookup.get(id).cloned().unwrap_or_else(|| id.clone()),
            requests: usage.requests,
            cost: usage.cost,
        })
        .collect();
    lines.sort_by(|a, b| a.name.cmp(&b.name));
    lines
}

pub fn format_cost(cost: f64) -> String {
    format!("${cost:.6}")
}
