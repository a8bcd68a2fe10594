//! The popup: submit requests for the active tab and manage its history.
//!
//! Every user action runs through [`PopupController`], marks the session as
//! processing while it runs and ends with exactly one [`Status`]. Errors
//! are logged and shortened with [`format_error_message`] at that boundary.

mod session;
mod status;


use std::sync::Arc;

use pagemagic_ai::CssGenerator;
use pagemagic_common::{
    all_disabled, HistoryEntry, PageMagicError, PageRequest, ScopeKey, ScopeKind,
};
use pagemagic_page::{request, PageChannel};
use pagemagic_storage::Storage;
use tracing::{debug, info, warn};

pub use session::{PopupSession, TabInfo};
pub use status::{format_error_message, Status, StatusKind};

pub struct PopupController {
    storage: Storage,
    generator: Arc<dyn CssGenerator>,
    channel: Arc<dyn PageChannel>,
    session: PopupSession,
}

impl PopupController {
    pub fn new(
        storage: Storage,
        generator: Arc<dyn CssGenerator>,
        channel: Arc<dyn PageChannel>,
    ) -> Self {
        Self {
            storage,
            generator,
            channel,
            session: PopupSession::default(),
        }
    }

    pub fn session(&self) -> &PopupSession {
        &self.session
    }

    pub fn take_prompt_draft(&mut self) -> Option<String> {
        self.session.prompt_draft.take()
    }

    /// Bind to `tab`, read the scope preference and return the history.
    pub async fn load_state(&mut self, tab: TabInfo) -> Result<Vec<HistoryEntry>, PageMagicError> {
        self.session.tab_id = Some(tab.id);
        self.session.tab_url = Some(tab.url);
        self.session.html_cache = None;

        let result = self.reload_state().await;
        if let Err(e) = &result {
            warn!(error = %e, "failed to load popup state");
            self.session.status = Some(Status::error("Error loading extension state."));
        }
        result
    }

    async fn reload_state(&mut self) -> Result<Vec<HistoryEntry>, PageMagicError> {
        self.session.domain_wide = self.storage.preferences().domain_wide().await?;
        self.history().await
    }

    /// History of the active scope, oldest first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, PageMagicError> {
        let scope = self.active_scope()?;
        Ok(self.storage.history().load(&scope).await?)
    }

    /// Generate CSS for `prompt`, apply it to the page and record it.
    pub async fn submit_prompt(&mut self, prompt: &str) -> Status {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self.conclude(Ok(Status::error("Please enter a customization request.")));
        }
        let Some(tab_id) = self.session.tab_id else {
            return self.conclude(Ok(Status::error(
                "No active tab identified. Cannot apply changes.",
            )));
        };

        self.session.processing = true;
        let result = self.apply_prompt(tab_id, prompt).await;
        self.conclude(result)
    }

    /// Remove an entry and keep its request as the prompt draft.
    pub async fn edit_entry(&mut self, id: &str) -> Status {
        self.session.processing = true;
        let result = self.edit_inner(id).await;
        self.conclude(result)
    }

    pub async fn toggle_entry(&mut self, id: &str) -> Status {
        self.session.processing = true;
        let result = self.toggle_inner(id).await;
        self.conclude(result)
    }

    pub async fn remove_entry(&mut self, id: &str) -> Status {
        self.session.processing = true;
        let result = self.remove_inner(id).await;
        self.conclude(result)
    }

    /// Disable every entry, or enable them all when all are disabled.
    pub async fn toggle_all(&mut self) -> Status {
        self.session.processing = true;
        let result = self.toggle_all_inner().await;
        self.conclude(result)
    }

    pub async fn remove_all(&mut self) -> Status {
        self.session.processing = true;
        let result = self.remove_all_inner().await;
        self.conclude(result)
    }

    /// Switch between page and domain scope, moving the stored history.
    pub async fn set_domain_wide(&mut self, domain_wide: bool) -> Status {
        self.session.processing = true;
        let result = self.set_domain_wide_inner(domain_wide).await;
        self.conclude(result)
    }

    /// Reload state when the tab navigated since the popup opened.
    /// Returns whether anything changed.
    pub async fn refresh_on_navigation(&mut self) -> Result<bool, PageMagicError> {
        let Some(tab_id) = self.session.tab_id else {
            return Ok(false);
        };
        let url = self.channel.tab_url(tab_id).await?;
        if self.session.tab_url.as_deref() == Some(url.as_str()) {
            return Ok(false);
        }

        info!(tab_id, url = %url, "tab navigated, reloading popup state");
        self.load_state(TabInfo { id: tab_id, url }).await?;
        Ok(true)
    }

    async fn apply_prompt(&mut self, tab_id: u32, prompt: &str) -> Result<Status, PageMagicError> {
        let tab = TabInfo {
            id: tab_id,
            url: self.channel.tab_url(tab_id).await?,
        };

        if !self.session.html_is_current(&tab) {
            self.show(Status::loading("Getting page content..."));
            let reply = request(self.channel.as_ref(), tab.id, PageRequest::GetHtml).await?;
            let html = reply
                .html
                .filter(|html| !html.is_empty())
                .ok_or_else(|| PageMagicError::Other("Failed to get page content.".into()))?;
            self.session.html_cache = Some(html);
            self.session.tab_id = Some(tab.id);
            self.session.tab_url = Some(tab.url);
        }
        let html = self.session.html_cache.clone().unwrap_or_default();

        self.show(Status::loading("Generating CSS..."));
        let generation = self.generator.generate_css(&html, prompt).await?;
        if generation.css.trim().is_empty() {
            warn!(model = %generation.model, "generated css is empty");
            return Ok(Status::error(
                "Model returned empty CSS. Try rephrasing or a different model.",
            ));
        }

        self.show(Status::loading("Applying changes..."));
        request(
            self.channel.as_ref(),
            tab_id,
            PageRequest::InjectCss {
                css: generation.css.clone(),
            },
        )
        .await?;

        let scope = self.active_scope()?;
        let repo = self.storage.history();
        let mut entries = repo.load(&scope).await?;
        entries.push(HistoryEntry::new(prompt, generation.css));
        repo.commit(&scope, &entries).await?;
        self.reload_page_css().await;

        info!(scope = %scope, entries = entries.len(), "change applied");
        Ok(Status::success("Changes applied!"))
    }

    async fn edit_inner(&mut self, id: &str) -> Result<Status, PageMagicError> {
        let scope = self.active_scope()?;
        let repo = self.storage.history();
        let mut entries = repo.load(&scope).await?;
        let Some(pos) = entries.iter().position(|entry| entry.id == id) else {
            return Ok(Status::error("Change not found."));
        };

        let entry = entries.remove(pos);
        repo.commit(&scope, &entries).await?;
        self.reload_page_css().await;

        self.session.prompt_draft = Some(entry.prompt);
        Ok(Status::success("Change removed. Edit the request and apply again."))
    }

    async fn toggle_inner(&mut self, id: &str) -> Result<Status, PageMagicError> {
        let scope = self.active_scope()?;
        let repo = self.storage.history();
        let mut entries = repo.load(&scope).await?;
        let Some(entry) = entries.iter_mut().find(|entry| entry.id == id) else {
            return Ok(Status::error("Change not found."));
        };

        entry.disabled = !entry.disabled;
        let message = if entry.disabled {
            "Change disabled."
        } else {
            "Change enabled."
        };
        repo.commit(&scope, &entries).await?;
        self.reload_page_css().await;
        Ok(Status::success(message))
    }

    async fn remove_inner(&mut self, id: &str) -> Result<Status, PageMagicError> {
        let scope = self.active_scope()?;
        let repo = self.storage.history();
        let mut entries = repo.load(&scope).await?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(Status::error("Change not found."));
        }

        repo.commit(&scope, &entries).await?;
        self.reload_page_css().await;
        Ok(Status::success("Change removed."))
    }

    async fn toggle_all_inner(&mut self) -> Result<Status, PageMagicError> {
        let scope = self.active_scope()?;
        let repo = self.storage.history();
        let mut entries = repo.load(&scope).await?;
        if entries.is_empty() {
            return Ok(Status::error("No changes to disable/enable."));
        }

        let disable = !all_disabled(&entries);
        for entry in &mut entries {
            entry.disabled = disable;
        }
        repo.commit(&scope, &entries).await?;
        self.reload_page_css().await;

        Ok(Status::success(if disable {
            "All changes disabled."
        } else {
            "All changes enabled."
        }))
    }

    async fn remove_all_inner(&mut self) -> Result<Status, PageMagicError> {
        let scope = self.active_scope()?;
        let repo = self.storage.history();
        if repo.load(&scope).await?.is_empty() {
            return Ok(Status::error("No changes to remove."));
        }

        repo.commit(&scope, &[]).await?;

        if let Some(tab_id) = self.session.tab_id {
            if let Err(e) = request(self.channel.as_ref(), tab_id, PageRequest::RemoveCss).await {
                warn!(tab_id, error = %e, "removeCSS failed, stripping styles directly");
                self.channel.execute_style_cleanup(tab_id).await?;
            }
        }

        info!(scope = %scope, "all changes removed");
        Ok(Status::success("All changes removed."))
    }

    async fn set_domain_wide_inner(&mut self, domain_wide: bool) -> Result<Status, PageMagicError> {
        let old_scope = self.active_scope()?;

        self.storage.preferences().set_domain_wide(domain_wide).await?;
        self.session.domain_wide = domain_wide;

        let new_scope = self.active_scope()?;
        self.storage.history().migrate(&old_scope, &new_scope).await?;
        self.reload_page_css().await;

        Ok(Status::success(if domain_wide {
            "Changes now apply to the entire domain."
        } else {
            "Changes now apply to this page only."
        }))
    }

    fn active_scope(&self) -> Result<ScopeKey, PageMagicError> {
        let url = self
            .session
            .tab_url
            .as_deref()
            .ok_or_else(|| PageMagicError::Other("Cannot operate on this tab.".into()))?;
        ScopeKey::parse_url(url, ScopeKind::from_domain_wide(self.session.domain_wide))
    }

    /// Ask the page to re-read its CSS. The stored state is already
    /// correct, so failures are only logged.
    async fn reload_page_css(&self) {
        let Some(tab_id) = self.session.tab_id else {
            return;
        };
        if let Err(e) = request(self.channel.as_ref(), tab_id, PageRequest::ReloadCss).await {
            warn!(tab_id, error = %e, "failed to reload css on page");
        }
    }

    fn show(&mut self, status: Status) {
        debug!(status = %status, "popup status");
        self.session.status = Some(status);
    }

    fn conclude(&mut self, result: Result<Status, PageMagicError>) -> Status {
        let status = result.unwrap_or_else(|e| {
            warn!(error = %e, "popup action failed");
            Status::error(format_error_message(&e.to_string()))
        });
        self.session.processing = false;
        self.session.status = Some(status.clone());
        status
    }
}
