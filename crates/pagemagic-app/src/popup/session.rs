//! Popup state for one opening of the popup.

use super::status::Status;

/// The tab the popup was opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: u32,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct PopupSession {
    pub tab_id: Option<u32>,
    pub tab_url: Option<String>,
    /// Page HTML fetched for the current tab URL.
    pub html_cache: Option<String>,
    pub domain_wide: bool,
    pub processing: bool,
    pub status: Option<Status>,
    /// Request text handed back by an edit.
    pub prompt_draft: Option<String>,
}

impl PopupSession {
    /// Whether the cached HTML belongs to `tab`.
    pub fn html_is_current(&self, tab: &TabInfo) -> bool {
        self.html_cache.is_some()
            && self.tab_id == Some(tab.id)
            && self.tab_url.as_deref() == Some(tab.url.as_str())
    }
}
