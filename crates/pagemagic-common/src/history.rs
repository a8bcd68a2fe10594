//! Prompt history entries and the CSS set derived from them.

use serde::{Deserialize, Serialize};

use crate::id::new_id;

/// One user request and the CSS it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub css: String,
    /// Creation time in Unix milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl HistoryEntry {
    pub fn new(prompt: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            prompt: prompt.into(),
            css: css.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            disabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

/// The applied CSS set: `css` of every enabled entry, in history order.
pub fn applied_css(entries: &[HistoryEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| entry.is_enabled())
        .map(|entry| entry.css.clone())
        .collect()
}

/// `true` when every entry is disabled (vacuously true for no entries).
pub fn all_disabled(entries: &[HistoryEntry]) -> bool {
    entries.iter().all(|entry| entry.disabled)
}
