//! Per-page state: the applied CSS list and its rendering.

use pagemagic_common::{PageMagicError, PageRequest, PageResponse, ScopeKey};
use pagemagic_storage::Storage;
use tracing::{debug, info, warn};
use url::Url;

use crate::host::StyleHost;

/// One page load.
///
/// `applied` is kept in application order; the rendered stylesheet is its
/// `\n`-join. Every mutation starts from the storage record of the active
/// scope and writes `applied` back to it.
pub struct PageSession<H> {
    url: Url,
    scope: ScopeKey,
    applied: Vec<String>,
    host: H,
    storage: Storage,
}

impl<H: StyleHost> PageSession<H> {
    /// Attach to a freshly loaded page and render any stored CSS.
    pub async fn attach(url: &str, host: H, storage: Storage) -> Result<Self, PageMagicError> {
        let url = Url::parse(url).map_err(|e| PageMagicError::InvalidUrl(format!("{url}: {e}")))?;
        let scope = resolve_scope(&url, &storage).await?;

        let mut session = Self {
            url,
            scope,
            applied: Vec::new(),
            host,
            storage,
        };

        match session.storage.history().load_css(&session.scope).await {
            Ok(stored) => session.applied = stored,
            Err(e) => warn!(scope = %session.scope, error = %e, "failed to load stored css"),
        }
        if !session.applied.is_empty() {
            session.render();
            info!(scope = %session.scope, rules = session.applied.len(), "stored css applied");
        }
        Ok(session)
    }

    /// Answer one popup request. Failures become `success: false` replies.
    pub async fn handle(&mut self, request: PageRequest) -> PageResponse {
        let action = request.action();
        debug!(action, url = %self.url, "page request");

        let result = match request {
            PageRequest::GetTitle => Ok(PageResponse::with_title(self.host.title())),
            PageRequest::GetHtml => Ok(PageResponse::with_html(self.host.html())),
            PageRequest::InjectCss { css } => self.inject_css(css).await.map(|_| PageResponse::ok()),
            PageRequest::RemoveCss => self.remove_css().await.map(|_| PageResponse::ok()),
            PageRequest::ReloadCss => self.reload_css().await.map(|_| PageResponse::ok()),
        };

        result.unwrap_or_else(|e| {
            warn!(action, error = %e, "page request failed");
            PageResponse::failure(e.to_string())
        })
    }

    /// Append `css` to the stored set of the current scope, re-render and
    /// persist. The stored set may have changed since this page loaded.
    pub async fn inject_css(&mut self, css: String) -> Result<(), PageMagicError> {
        self.scope = resolve_scope(&self.url, &self.storage).await?;
        self.applied = self.storage.history().load_css(&self.scope).await?;
        self.applied.push(css);
        self.render();
        self.persist().await
    }

    /// Drop every rule, remove the element and the stored record.
    pub async fn remove_css(&mut self) -> Result<(), PageMagicError> {
        self.applied.clear();
        self.host.remove_styles();
        self.persist().await
    }

    /// Re-resolve the scope and re-read its stored CSS.
    pub async fn reload_css(&mut self) -> Result<(), PageMagicError> {
        self.scope = resolve_scope(&self.url, &self.storage).await?;
        self.applied = self.storage.history().load_css(&self.scope).await?;
        self.render();
        debug!(scope = %self.scope, rules = self.applied.len(), "css reloaded");
        Ok(())
    }

    pub fn stylesheet(&self) -> String {
        self.applied.join("\n")
    }

    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Strip managed styles from the host without touching the list.
    pub fn clear_host_styles(&mut self) -> usize {
        self.host.remove_styles()
    }

    fn render(&mut self) {
        if self.applied.is_empty() {
            self.host.remove_styles();
        } else {
            let css = self.stylesheet();
            self.host.render_style(&css);
        }
    }

    async fn persist(&self) -> Result<(), PageMagicError> {
        self.storage
            .history()
            .save_css(&self.scope, &self.applied)
            .await?;
        Ok(())
    }
}

async fn resolve_scope(url: &Url, storage: &Storage) -> Result<ScopeKey, PageMagicError> {
    let kind = storage.preferences().scope_kind().await?;
    ScopeKey::from_url(url, kind)
}
