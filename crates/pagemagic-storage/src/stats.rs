//! Storage statistics and bulk clearing, computed by scanning key prefixes.

use std::collections::BTreeSet;

use pagemagic_common::keys::{
    is_owned_key, is_scoped_key, is_usage_key, parse_scoped_key, ScopedRecord, CSS_PREFIX,
    HISTORY_PREFIX,
};
use pagemagic_common::{all_disabled, HistoryEntry, ScopeKey, StorageError};
use tracing::{info, warn};

use crate::KeyValueStore;

/// Counts shown on the settings page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub css_keys: usize,
    pub history_keys: usize,
    /// Distinct origins with history or CSS.
    pub domains: usize,
    /// Approximate size of every owned key, counted as UTF-16.
    pub total_bytes: usize,
}

impl StorageStats {
    pub fn has_scoped_data(&self) -> bool {
        self.css_keys > 0 || self.history_keys > 0
    }
}

/// A scope with stored history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSummary {
    pub scope: ScopeKey,
    pub entries: usize,
    /// `false` when every entry of the scope is disabled.
    pub enabled: bool,
}

pub async fn collect_stats(store: &dyn KeyValueStore) -> Result<StorageStats, StorageError> {
    let snapshot = store.snapshot().await?;
    let mut stats = StorageStats::default();
    let mut domains = BTreeSet::new();

    for (key, value) in &snapshot {
        if key.starts_with(CSS_PREFIX) {
            stats.css_keys += 1;
        } else if key.starts_with(HISTORY_PREFIX) {
            stats.history_keys += 1;
        }

        if is_scoped_key(key) {
            match parse_scoped_key(key) {
                Some((_, scope)) => {
                    domains.insert(scope.origin().to_string());
                }
                None => warn!(key, "malformed scope key in storage"),
            }
        }

        if is_owned_key(key) {
            let encoded_len = serde_json::to_string(value).map(|s| s.len()).unwrap_or(0);
            stats.total_bytes += (encoded_len + key.len()) * 2;
        }
    }

    stats.domains = domains.len();
    Ok(stats)
}

/// Every scope with a history record, sorted by display URL.
pub async fn list_sites(store: &dyn KeyValueStore) -> Result<Vec<SiteSummary>, StorageError> {
    let snapshot = store.snapshot().await?;
    let mut sites = Vec::new();

    for (key, value) in snapshot {
        let Some((ScopedRecord::History, scope)) = parse_scoped_key(&key) else {
            continue;
        };
        let entries: Vec<HistoryEntry> = match serde_json::from_value(value) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key, error = %e, "skipping unreadable history record");
                continue;
            }
        };
        if entries.is_empty() {
            continue;
        }
        sites.push(SiteSummary {
            enabled: !all_disabled(&entries),
            entries: entries.len(),
            scope,
        });
    }

    sites.sort_by_key(|site| site.scope.display_url());
    Ok(sites)
}

/// Remove every history and CSS key. Returns the number of keys removed.
pub async fn clear_scoped_data(store: &dyn KeyValueStore) -> Result<usize, StorageError> {
    remove_matching(store, is_scoped_key, "css/history").await
}

/// Remove daily usage, total usage and the model lookup.
pub async fn clear_usage_data(store: &dyn KeyValueStore) -> Result<usize, StorageError> {
    remove_matching(store, is_usage_key, "usage").await
}

/// Remove every key owned by PageMagic.
pub async fn clear_owned_keys(store: &dyn KeyValueStore) -> Result<usize, StorageError> {
    remove_matching(store, is_owned_key, "all").await
}

async fn remove_matching(
    store: &dyn KeyValueStore,
    predicate: fn(&str) -> bool,
    label: &str,
) -> Result<usize, StorageError> {
    let keys: Vec<String> = store
        .snapshot()
        .await?
        .into_keys()
        .filter(|key| predicate(key))
        .collect();
    if !keys.is_empty() {
        store.remove(&keys).await?;
    }
    info!(kind = label, removed = keys.len(), "storage cleared");
    Ok(keys.len())
}

/// Human-readable size with one decimal (`0 B`, `1.5 KB`, ...).
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{rounded:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HistoryRepo, MemoryStore};
    use pagemagic_common::keys::{TOTAL_USAGE_KEY, DOMAIN_WIDE_KEY};
    use pagemagic_common::ScopeKind;
    use serde_json::json;
    use std::sync::Arc;

    async fn seeded() -> Arc<dyn KeyValueStore> {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let repo = HistoryRepo::new(store.clone());

        let a_page = ScopeKey::parse_url("https://a.com/x", ScopeKind::Page).unwrap();
        let a_domain = ScopeKey::parse_url("https://a.com/", ScopeKind::Domain).unwrap();
        let b_page = ScopeKey::parse_url("https://b.org/y", ScopeKind::Page).unwrap();

        repo.commit(&a_page, &[HistoryEntry::new("p", "a{}")]).await.unwrap();
        repo.commit(&a_domain, &[HistoryEntry::new("p", "b{}")]).await.unwrap();
        let disabled = HistoryEntry {
            disabled: true,
            ..HistoryEntry::new("p", "c{}")
        };
        repo.commit(&b_page, &[disabled]).await.unwrap();

        store.set(TOTAL_USAGE_KEY, json!({"totalRequests": 1})).await.unwrap();
        store.set("pagemagic_usage_2024-01-01", json!({})).await.unwrap();
        store.set(DOMAIN_WIDE_KEY, json!(false)).await.unwrap();
        store.set("unrelated", json!("x")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn stats_count_keys_and_domains() {
        let store = seeded().await;
        let stats = collect_stats(store.as_ref()).await.unwrap();
        assert_eq!(stats.css_keys, 2);
        assert_eq!(stats.history_keys, 3);
        assert_eq!(stats.domains, 2);
        assert!(stats.total_bytes > 0);
        assert!(stats.has_scoped_data());
    }

    #[tokio::test]
    async fn sites_report_kind_and_enabled_state() {
        let store = seeded().await;
        let sites = list_sites(store.as_ref()).await.unwrap();
        let urls: Vec<String> = sites.iter().map(|s| s.scope.display_url()).collect();
        assert_eq!(urls, vec!["https://a.com/", "https://a.com/x", "https://b.org/y"]);

        assert_eq!(sites[0].scope.kind(), ScopeKind::Domain);
        assert_eq!(sites[1].scope.kind(), ScopeKind::Page);
        assert!(sites[1].enabled);
        assert!(!sites[2].enabled);
    }

    #[tokio::test]
    async fn clearing_is_prefix_scoped() {
        let store = seeded().await;

        assert_eq!(clear_scoped_data(store.as_ref()).await.unwrap(), 5);
        assert_eq!(collect_stats(store.as_ref()).await.unwrap().history_keys, 0);
        assert!(store.get(TOTAL_USAGE_KEY).await.unwrap().is_some());

        assert_eq!(clear_usage_data(store.as_ref()).await.unwrap(), 2);
        assert!(store.get(DOMAIN_WIDE_KEY).await.unwrap().is_some());

        assert_eq!(clear_owned_keys(store.as_ref()).await.unwrap(), 1);
        assert_eq!(store.get("unrelated").await.unwrap(), Some(json!("x")));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
    }
}
