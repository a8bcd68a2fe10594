//! History and applied-CSS records per scope.

use std::sync::Arc;

use pagemagic_common::keys::{css_key, history_key};
use pagemagic_common::{applied_css, HistoryEntry, ScopeKey, StorageError};
use tracing::{debug, info};

use crate::typed::{get_json, remove_key, set_json};
use crate::KeyValueStore;

/// Reads and writes the history list and applied CSS list of a scope.
#[derive(Clone)]
pub struct HistoryRepo {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryRepo {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, scope: &ScopeKey) -> Result<Vec<HistoryEntry>, StorageError> {
        Ok(get_json(self.store.as_ref(), &history_key(scope))
            .await?
            .unwrap_or_default())
    }

    /// Persist `entries`; an empty list removes the key.
    pub async fn save(&self, scope: &ScopeKey, entries: &[HistoryEntry]) -> Result<(), StorageError> {
        let key = history_key(scope);
        if entries.is_empty() {
            remove_key(self.store.as_ref(), &key).await
        } else {
            set_json(self.store.as_ref(), &key, entries).await
        }
    }

    pub async fn load_css(&self, scope: &ScopeKey) -> Result<Vec<String>, StorageError> {
        Ok(get_json(self.store.as_ref(), &css_key(scope))
            .await?
            .unwrap_or_default())
    }

    /// Persist an applied CSS list; an empty list removes the key.
    pub async fn save_css(&self, scope: &ScopeKey, css: &[String]) -> Result<(), StorageError> {
        let key = css_key(scope);
        if css.is_empty() {
            remove_key(self.store.as_ref(), &key).await
        } else {
            set_json(self.store.as_ref(), &key, css).await
        }
    }

    /// Recompute the applied CSS set from `entries` and persist it.
    pub async fn sync_css(
        &self,
        scope: &ScopeKey,
        entries: &[HistoryEntry],
    ) -> Result<Vec<String>, StorageError> {
        let css = applied_css(entries);
        self.save_css(scope, &css).await?;
        debug!(scope = %scope, rules = css.len(), "applied css updated");
        Ok(css)
    }

    /// Save `entries` and the CSS set derived from them.
    pub async fn commit(
        &self,
        scope: &ScopeKey,
        entries: &[HistoryEntry],
    ) -> Result<Vec<String>, StorageError> {
        self.save(scope, entries).await?;
        self.sync_css(scope, entries).await
    }

    /// Move every entry of `from` into `to`.
    ///
    /// Entries already stored under `to` are kept first; ids present in both
    /// are not duplicated. Both of `from`'s keys are removed and `to`'s CSS
    /// set is recomputed. Returns the number of entries moved.
    pub async fn migrate(&self, from: &ScopeKey, to: &ScopeKey) -> Result<usize, StorageError> {
        if from == to {
            return Ok(0);
        }

        let moving = self.load(from).await?;
        if moving.is_empty() {
            // No history left: any css record here is stale.
            self.delete_scope(from).await?;
            return Ok(0);
        }

        let mut merged = self.load(to).await?;
        let mut moved = 0;
        for entry in moving {
            if merged.iter().all(|existing| existing.id != entry.id) {
                merged.push(entry);
                moved += 1;
            }
        }

        self.commit(to, &merged).await?;
        self.delete_scope(from).await?;
        info!(from = %from, to = %to, moved, "history migrated");
        Ok(moved)
    }

    /// Remove both records of a scope.
    pub async fn delete_scope(&self, scope: &ScopeKey) -> Result<(), StorageError> {
        self.store
            .remove(&[history_key(scope), css_key(scope)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use pagemagic_common::ScopeKind;

    fn repo() -> (HistoryRepo, Arc<dyn KeyValueStore>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        (HistoryRepo::new(store.clone()), store)
    }

    fn page() -> ScopeKey {
        ScopeKey::parse_url("https://a.com/docs/", ScopeKind::Page).unwrap()
    }

    fn domain() -> ScopeKey {
        ScopeKey::parse_url("https://a.com/docs/", ScopeKind::Domain).unwrap()
    }

    fn entry(css: &str, disabled: bool) -> HistoryEntry {
        HistoryEntry {
            disabled,
            ..HistoryEntry::new("p", css)
        }
    }

    #[tokio::test]
    async fn commit_persists_enabled_css_only() {
        let (repo, _) = repo();
        let entries = vec![entry("a{}", false), entry("b{}", true), entry("c{}", false)];

        let css = repo.commit(&page(), &entries).await.unwrap();
        assert_eq!(css, vec!["a{}", "c{}"]);
        assert_eq!(repo.load(&page()).await.unwrap(), entries);
        assert_eq!(repo.load_css(&page()).await.unwrap(), vec!["a{}", "c{}"]);
    }

    #[tokio::test]
    async fn all_disabled_removes_css_key() {
        let (repo, store) = repo();
        repo.commit(&page(), &[entry("a{}", false)]).await.unwrap();
        repo.commit(&page(), &[entry("a{}", true)]).await.unwrap();

        assert!(store.get(&css_key(&page())).await.unwrap().is_none());
        assert!(store.get(&history_key(&page())).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_history_removes_both_keys() {
        let (repo, store) = repo();
        repo.commit(&page(), &[entry("a{}", false)]).await.unwrap();
        repo.commit(&page(), &[]).await.unwrap();
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn migrate_moves_entries_and_clears_old_keys() {
        let (repo, store) = repo();
        let entries = vec![entry("a{}", false), entry("b{}", true)];
        repo.commit(&page(), &entries).await.unwrap();

        let moved = repo.migrate(&page(), &domain()).await.unwrap();
        assert_eq!(moved, 2);
        assert_eq!(repo.load(&domain()).await.unwrap(), entries);
        assert_eq!(repo.load_css(&domain()).await.unwrap(), vec!["a{}"]);
        assert!(store.get(&history_key(&page())).await.unwrap().is_none());
        assert!(store.get(&css_key(&page())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn migrate_appends_to_existing_target() {
        let (repo, _) = repo();
        let existing = entry("x{}", false);
        let incoming = entry("y{}", false);
        repo.commit(&domain(), &[existing.clone()]).await.unwrap();
        repo.commit(&page(), &[incoming.clone()]).await.unwrap();

        repo.migrate(&page(), &domain()).await.unwrap();
        assert_eq!(repo.load(&domain()).await.unwrap(), vec![existing, incoming]);
        assert_eq!(repo.load_css(&domain()).await.unwrap(), vec!["x{}", "y{}"]);
    }

    #[tokio::test]
    async fn migrate_drops_orphaned_css_record() {
        let (repo, store) = repo();
        repo.save_css(&page(), &["x{}".to_string()]).await.unwrap();

        assert_eq!(repo.migrate(&page(), &domain()).await.unwrap(), 0);
        assert!(store.get(&css_key(&page())).await.unwrap().is_none());
        assert!(repo.load_css(&domain()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn migrate_with_nothing_to_move_is_noop() {
        let (repo, store) = repo();
        assert_eq!(repo.migrate(&page(), &domain()).await.unwrap(), 0);
        assert_eq!(repo.migrate(&page(), &page()).await.unwrap(), 0);
        assert!(store.snapshot().await.unwrap().is_empty());
    }
}
