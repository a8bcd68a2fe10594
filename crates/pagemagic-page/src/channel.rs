//! Popup-to-page messaging.

use async_trait::async_trait;
use pagemagic_common::{MessagingError, PageRequest, PageResponse};

/// Delivers requests to the page loaded in a tab.
#[async_trait]
pub trait PageChannel: Send + Sync {
    async fn send(&self, tab_id: u32, request: PageRequest) -> Result<PageResponse, MessagingError>;

    /// URL currently loaded in the tab.
    async fn tab_url(&self, tab_id: u32) -> Result<String, MessagingError>;

    /// Strip managed style elements from the tab directly, bypassing the
    /// page session. Returns how many were removed.
    async fn execute_style_cleanup(&self, tab_id: u32) -> Result<usize, MessagingError>;
}

/// Send `request` and turn a `success: false` reply into an error.
pub async fn request(
    channel: &dyn PageChannel,
    tab_id: u32,
    request: PageRequest,
) -> Result<PageResponse, MessagingError> {
    let action = request.action();
    channel.send(tab_id, request).await?.into_result(action)
}
