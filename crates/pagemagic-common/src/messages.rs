//! Message protocol between the popup and the page script.
//!
//! Requests are action-tagged JSON objects (`{"action": "injectCSS", "css": ...}`);
//! every reply is a [`PageResponse`] with a `success` flag and an optional
//! error string.

use serde::{Deserialize, Serialize};

use crate::errors::MessagingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum PageRequest {
    #[serde(rename = "getTitle")]
    GetTitle,
    #[serde(rename = "getHTML")]
    GetHtml,
    #[serde(rename = "injectCSS")]
    InjectCss { css: String },
    #[serde(rename = "removeCSS")]
    RemoveCss,
    #[serde(rename = "reloadCSS")]
    ReloadCss,
}

impl PageRequest {
    /// Wire name of the action.
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetTitle => "getTitle",
            Self::GetHtml => "getHTML",
            Self::InjectCss { .. } => "injectCSS",
            Self::RemoveCss => "removeCSS",
            Self::ReloadCss => "reloadCSS",
        }
    }

    /// Parse a request from raw JSON.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl PageResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::ok()
        }
    }

    pub fn with_html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Self::ok()
        }
    }

    /// Turn an unsuccessful reply to `action` into an error.
    pub fn into_result(self, action: &str) -> Result<Self, MessagingError> {
        if self.success {
            Ok(self)
        } else {
            Err(MessagingError::Rejected {
                action: action.to_string(),
                message: self
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            })
        }
    }
}
