//! In-process tabs: one page session per tab id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pagemagic_common::{MessagingError, PageMagicError, PageRequest, PageResponse};
use pagemagic_storage::{Storage, TabState};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::channel::PageChannel;
use crate::host::StyleHost;
use crate::session::PageSession;

type SharedSession<H> = Arc<Mutex<PageSession<H>>>;

/// Maps tab ids to page sessions and speaks the JSON message protocol to
/// them.
pub struct TabRegistry<H> {
    storage: Storage,
    tabs: RwLock<HashMap<u32, SharedSession<H>>>,
    next_id: AtomicU32,
}

impl<H: StyleHost + 'static> TabRegistry<H> {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            tabs: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Open a tab on `url` and attach a session. Returns the tab id.
    pub async fn open(&self, url: &str, host: H) -> Result<u32, PageMagicError> {
        let session = PageSession::attach(url, host, self.storage.clone()).await?;
        let tab_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.remember(tab_id, &session).await?;
        self.tabs
            .write()
            .await
            .insert(tab_id, Arc::new(Mutex::new(session)));
        info!(tab_id, url, "tab opened");
        Ok(tab_id)
    }

    /// Load a new page in an existing tab; the old session ends.
    pub async fn navigate(&self, tab_id: u32, url: &str, host: H) -> Result<(), PageMagicError> {
        let session = PageSession::attach(url, host, self.storage.clone()).await?;
        let mut tabs = self.tabs.write().await;
        if !tabs.contains_key(&tab_id) {
            return Err(MessagingError::NoReceiver(tab_id).into());
        }
        self.remember(tab_id, &session).await?;
        tabs.insert(tab_id, Arc::new(Mutex::new(session)));
        debug!(tab_id, url, "tab navigated");
        Ok(())
    }

    pub async fn close(&self, tab_id: u32) -> Result<(), PageMagicError> {
        let removed = self.tabs.write().await.remove(&tab_id).is_some();
        if !removed {
            return Err(MessagingError::NoReceiver(tab_id).into());
        }
        self.storage.preferences().clear_tab_state(tab_id).await?;
        debug!(tab_id, "tab closed");
        Ok(())
    }

    /// Last URL loaded in the tab, kept across popup openings.
    async fn remember(&self, tab_id: u32, session: &PageSession<H>) -> Result<(), PageMagicError> {
        let state = TabState {
            url: session.url().to_string(),
        };
        self.storage.preferences().set_tab_state(tab_id, &state).await?;
        Ok(())
    }

    pub async fn tab_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.tabs.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn session(&self, tab_id: u32) -> Result<SharedSession<H>, MessagingError> {
        self.tabs
            .read()
            .await
            .get(&tab_id)
            .cloned()
            .ok_or(MessagingError::NoReceiver(tab_id))
    }

    /// Current document of a tab, managed styles included.
    pub async fn page_html(&self, tab_id: u32) -> Result<String, MessagingError> {
        let session = self.session(tab_id).await?;
        let html = session.lock().await.host().html();
        Ok(html)
    }

    /// Handle one raw JSON request and return the raw JSON reply.
    pub async fn dispatch_json(&self, tab_id: u32, raw: &str) -> Result<String, MessagingError> {
        let request = PageRequest::from_json(raw)
            .ok_or_else(|| MessagingError::Protocol(format!("unrecognized request: {raw}")))?;
        let session = self.session(tab_id).await?;
        let response = session.lock().await.handle(request).await;
        serde_json::to_string(&response).map_err(|e| MessagingError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl<H: StyleHost + 'static> PageChannel for TabRegistry<H> {
    async fn send(&self, tab_id: u32, request: PageRequest) -> Result<PageResponse, MessagingError> {
        let raw = serde_json::to_string(&request)
            .map_err(|e| MessagingError::Protocol(e.to_string()))?;
        let reply = self.dispatch_json(tab_id, &raw).await?;
        serde_json::from_str(&reply).map_err(|e| MessagingError::Protocol(e.to_string()))
    }

    async fn tab_url(&self, tab_id: u32) -> Result<String, MessagingError> {
        let session = self.session(tab_id).await?;
        let url = session.lock().await.url().to_string();
        Ok(url)
    }

    async fn execute_style_cleanup(&self, tab_id: u32) -> Result<usize, MessagingError> {
        let session = self.session(tab_id).await?;
        let removed = session.lock().await.clear_host_styles();
        info!(tab_id, removed, "managed styles stripped");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::request;
    use crate::document::HtmlDocument;

    const PAGE: &str = "<html><head><title>Hello</title></head><body></body></html>";

    async fn registry_with_tab() -> (TabRegistry<HtmlDocument>, u32) {
        let registry = TabRegistry::new(Storage::in_memory());
        let tab = registry
            .open("https://a.com/x", HtmlDocument::new(PAGE))
            .await
            .unwrap();
        (registry, tab)
    }

    #[tokio::test]
    async fn json_protocol_round_trip() {
        let (registry, tab) = registry_with_tab().await;

        let reply = registry
            .dispatch_json(tab, r#"{"action":"getTitle"}"#)
            .await
            .unwrap();
        assert_eq!(reply, r#"{"success":true,"title":"Hello"}"#);

        let reply = registry
            .dispatch_json(tab, r#"{"action":"injectCSS","css":"a{}"}"#)
            .await
            .unwrap();
        assert_eq!(reply, r#"{"success":true}"#);
    }

    #[tokio::test]
    async fn unknown_action_is_protocol_error() {
        let (registry, tab) = registry_with_tab().await;
        let err = registry
            .dispatch_json(tab, r#"{"action":"explode"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::Protocol(_)));
    }

    #[tokio::test]
    async fn missing_tab_has_no_receiver() {
        let registry: TabRegistry<HtmlDocument> = TabRegistry::new(Storage::in_memory());
        let err = registry.send(9, PageRequest::GetHtml).await.unwrap_err();
        assert!(matches!(err, MessagingError::NoReceiver(9)));
    }

    #[tokio::test]
    async fn cleanup_strips_styles_directly() {
        let (registry, tab) = registry_with_tab().await;
        request(&registry, tab, PageRequest::InjectCss { css: "a{}".into() })
            .await
            .unwrap();
        assert_ne!(registry.page_html(tab).await.unwrap(), PAGE);

        assert_eq!(registry.execute_style_cleanup(tab).await.unwrap(), 1);
        assert_eq!(registry.page_html(tab).await.unwrap(), PAGE);
    }

    #[tokio::test]
    async fn navigate_reattaches_with_stored_css() {
        let (registry, tab) = registry_with_tab().await;
        request(&registry, tab, PageRequest::InjectCss { css: "a{}".into() })
            .await
            .unwrap();

        registry
            .navigate(tab, "https://a.com/other", HtmlDocument::new(PAGE))
            .await
            .unwrap();
        assert_eq!(registry.page_html(tab).await.unwrap(), PAGE);

        registry
            .navigate(tab, "https://a.com/x", HtmlDocument::new(PAGE))
            .await
            .unwrap();
        assert_eq!(registry.tab_url(tab).await.unwrap(), "https://a.com/x");
        let session = registry.session(tab).await.unwrap();
        assert_eq!(session.lock().await.stylesheet(), "a{}");
    }

    #[tokio::test]
    async fn close_forgets_tab() {
        let (registry, tab) = registry_with_tab().await;
        assert_eq!(registry.tab_ids().await, vec![tab]);
        let prefs = registry.storage.preferences();
        assert_eq!(
            prefs.tab_state(tab).await.unwrap().map(|s| s.url).as_deref(),
            Some("https://a.com/x")
        );

        registry.close(tab).await.unwrap();
        assert!(prefs.tab_state(tab).await.unwrap().is_none());
        assert!(registry.tab_ids().await.is_empty());
        assert!(registry.close(tab).await.is_err());
    }
}
