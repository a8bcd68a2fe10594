//! User-facing status lines.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn loading(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Loading,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

const MAX_ERROR_LEN: usize = 100;

/// Shorten an error for the status line.
pub fn format_error_message(message: &str) -> String {
    let lower = message.to_lowercase();

    if message.contains("API key not configured") {
        return "API key missing. Go to Settings.".into();
    }
    if message.contains("401") || lower.contains("authentication failed") {
        return "Authentication failed. Check API key in Settings.".into();
    }
    if message.contains("429") || lower.contains("rate limit") {
        return "Rate limit exceeded with API. Try again later.".into();
    }
    if lower.contains("context_length_exceeded")
        || lower.contains("context length")
        || lower.contains("page content too long")
    {
        return "Page content too long for this model.".into();
    }

    if message.chars().count() > MAX_ERROR_LEN {
        let truncated: String = message.chars().take(MAX_ERROR_LEN - 3).collect();
        format!("{truncated}...")
    } else {
        message.to_string()
    }
}
