//! Small local-area preferences: the domain-wide toggle and per-tab state.

use std::sync::Arc;

use pagemagic_common::keys::{tab_key, DOMAIN_WIDE_KEY};
use pagemagic_common::{ScopeKind, StorageError};
use serde::{Deserialize, Serialize};

use crate::typed::{get_json, remove_key, set_json};
use crate::KeyValueStore;

/// Transient state remembered for a tab between popup openings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabState {
    pub url: String,
}

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn domain_wide(&self) -> Result<bool, StorageError> {
        Ok(get_json(self.store.as_ref(), DOMAIN_WIDE_KEY)
            .await?
            .unwrap_or(false))
    }

    pub async fn set_domain_wide(&self, domain_wide: bool) -> Result<(), StorageError> {
        set_json(self.store.as_ref(), DOMAIN_WIDE_KEY, &domain_wide).await
    }

    /// Active scope granularity.
    pub async fn scope_kind(&self) -> Result<ScopeKind, StorageError> {
        Ok(ScopeKind::from_domain_wide(self.domain_wide().await?))
    }

    pub async fn tab_state(&self, tab_id: u32) -> Result<Option<TabState>, StorageError> {
        get_json(self.store.as_ref(), &tab_key(tab_id)).await
    }

    pub async fn set_tab_state(&self, tab_id: u32, state: &TabState) -> Result<(), StorageError> {
        set_json(self.store.as_ref(), &tab_key(tab_id), state).await
    }

    pub async fn clear_tab_state(&self, tab_id: u32) -> Result<(), StorageError> {
        remove_key(self.store.as_ref(), &tab_key(tab_id)).await
    }
}
