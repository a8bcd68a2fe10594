//! Storage key layout.
//!
//! Every persisted record lives under a fixed prefix. Keys derived from a
//! page are built here and nowhere else so the popup, the page script and
//! the settings page always agree.

use chrono::NaiveDate;

use crate::scope::ScopeKey;

/// Prefix shared by every local-area key owned by PageMagic.
pub const KEY_PREFIX: &str = "pagemagic_";
pub const HISTORY_PREFIX: &str = "pagemagic_history_";
pub const CSS_PREFIX: &str = "pagemagic_css_";
pub const USAGE_PREFIX: &str = "pagemagic_usage_";
pub const TAB_PREFIX: &str = "pagemagic_tab_";
pub const TOTAL_USAGE_KEY: &str = "pagemagic_total_usage";
pub const MODEL_LOOKUP_KEY: &str = "pagemagic_model_lookup";
pub const DOMAIN_WIDE_KEY: &str = "pagemagic_domain_wide";

/// Sync-area keys.
pub const API_KEY_KEY: &str = "openRouterApiKey";
pub const SELECTED_MODEL_KEY: &str = "selectedModel";

/// Which per-scope record a key holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopedRecord {
    History,
    Css,
}

pub fn history_key(scope: &ScopeKey) -> String {
    format!("{HISTORY_PREFIX}{}", scope.to_suffix())
}

pub fn css_key(scope: &ScopeKey) -> String {
    format!("{CSS_PREFIX}{}", scope.to_suffix())
}

pub fn usage_key(date: NaiveDate) -> String {
    format!("{USAGE_PREFIX}{}", date.format("%Y-%m-%d"))
}

pub fn tab_key(tab_id: u32) -> String {
    format!("{TAB_PREFIX}{tab_id}")
}

/// Split a history or CSS key back into its record kind and scope.
///
/// Returns `None` for keys of any other shape, including malformed
/// suffixes.
pub fn parse_scoped_key(key: &str) -> Option<(ScopedRecord, ScopeKey)> {
    let (record, suffix) = if let Some(rest) = key.strip_prefix(HISTORY_PREFIX) {
        (ScopedRecord::History, rest)
    } else if let Some(rest) = key.strip_prefix(CSS_PREFIX) {
        (ScopedRecord::Css, rest)
    } else {
        return None;
    };
    ScopeKey::from_suffix(suffix).ok().map(|scope| (record, scope))
}

pub fn is_scoped_key(key: &str) -> bool {
    key.starts_with(HISTORY_PREFIX) || key.starts_with(CSS_PREFIX)
}

pub fn is_usage_key(key: &str) -> bool {
    key.starts_with(USAGE_PREFIX) || key == TOTAL_USAGE_KEY || key == MODEL_LOOKUP_KEY
}

pub fn is_owned_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeKind;

    #[test]
    fn scoped_keys_use_scope_suffix() {
        let page = ScopeKey::parse_url("https://a.com/x/", ScopeKind::Page).unwrap();
        assert_eq!(history_key(&page), "pagemagic_history_https://a.com/x");
        assert_eq!(css_key(&page), "pagemagic_css_https://a.com/x");

        let domain = ScopeKey::parse_url("https://a.com/x/", ScopeKind::Domain).unwrap();
        assert_eq!(history_key(&domain), "pagemagic_history_https://a.com");
    }

    #[test]
    fn usage_key_is_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(usage_key(date), "pagemagic_usage_2024-03-09");
    }

    #[test]
    fn parse_scoped_key_recovers_scope() {
        let page = ScopeKey::parse_url("https://a.com/x", ScopeKind::Page).unwrap();
        let (record, scope) = parse_scoped_key(&css_key(&page)).unwrap();
        assert_eq!(record, ScopedRecord::Css);
        assert_eq!(scope, page);

        assert!(parse_scoped_key(TOTAL_USAGE_KEY).is_none());
        assert!(parse_scoped_key("pagemagic_css_garbage").is_none());
    }

    #[test]
    fn key_classification() {
        assert!(is_usage_key("pagemagic_usage_2024-01-01"));
        assert!(is_usage_key(TOTAL_USAGE_KEY));
        assert!(is_usage_key(MODEL_LOOKUP_KEY));
        assert!(!is_usage_key(DOMAIN_WIDE_KEY));
        assert!(is_scoped_key("pagemagic_history_https://a.com"));
        assert!(is_owned_key(&tab_key(3)));
        assert!(!is_owned_key(API_KEY_KEY));
    }
}
